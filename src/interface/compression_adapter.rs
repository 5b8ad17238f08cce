use crate::interface::ThreadSafe;
use crate::model::error::Error;
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;

/// Suffix used when a decompress target cannot be derived by stripping the extension.
pub const DECOMPRESSED_SUFFIX: &str = ".decompressed";

/// Per call overrides of an adapter's defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompressionOptions {
    pub level: Option<u32>,
    pub keep_original: Option<bool>,
}

#[async_trait]
pub trait CompressionAdapter: ThreadSafe {
    fn name(&self) -> &str;

    /// Extension without the leading dot.
    fn extension(&self) -> &str;

    /// Leading bytes every artifact of this format starts with.
    fn magic(&self) -> &'static [u8];

    async fn compress(
        &self,
        source: &Path,
        target: Option<&Path>,
        options: CompressionOptions,
    ) -> Result<PathBuf, Error>;

    async fn decompress(
        &self,
        source: &Path,
        target: Option<&Path>,
        options: CompressionOptions,
    ) -> Result<PathBuf, Error>;

    /// Extension first, then the magic bytes of the file when it exists.
    async fn supports(&self, path: &Path) -> bool {
        if has_extension(path, self.extension()) {
            return true;
        }
        starts_with_magic(path, self.magic()).await
    }

    fn compress_target(&self, source: &Path) -> PathBuf {
        append_suffix(source, &format!(".{}", self.extension()))
    }

    fn decompress_target(&self, source: &Path) -> PathBuf {
        match strip_extension(source, self.extension()) {
            Some(stripped) => stripped,
            None => append_suffix(source, DECOMPRESSED_SUFFIX),
        }
    }
}

pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|value| value.to_str())
        .is_some_and(|value| value.eq_ignore_ascii_case(extension))
}

pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

fn strip_extension(path: &Path, extension: &str) -> Option<PathBuf> {
    if !has_extension(path, extension) {
        return None;
    }
    let stem = path.file_stem().filter(|stem| !stem.is_empty())?;
    Some(path.with_file_name(stem))
}

pub async fn starts_with_magic(path: &Path, magic: &[u8]) -> bool {
    let Ok(file) = tokio::fs::File::open(path).await else {
        return false;
    };
    let mut header = Vec::with_capacity(magic.len());
    match file.take(magic.len() as u64).read_to_end(&mut header).await {
        Ok(_) => header == magic,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match_ignores_case() {
        assert!(has_extension(Path::new("/tmp/a.GZ"), "gz"));
        assert!(!has_extension(Path::new("/tmp/a.gzip"), "gz"));
        assert!(!has_extension(Path::new("/tmp/gz"), "gz"));
    }

    #[test]
    fn strip_keeps_inner_extensions() {
        assert_eq!(
            strip_extension(Path::new("/b/nightly.tar.gz"), "gz"),
            Some(PathBuf::from("/b/nightly.tar"))
        );
        assert_eq!(strip_extension(Path::new("/b/nightly.tar"), "gz"), None);
    }
}
