use crate::core::compression::{
    DEFAULT_LEVEL, publish, remove_partial, remove_source, run_blocking, staging_path,
};
use crate::interface::compression_adapter::{CompressionAdapter, CompressionOptions};
use crate::model::error::Error;
use crate::model::error::compression::CompressionError;
use async_trait::async_trait;
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const GZIP_MAGIC: &[u8] = &[0x1F, 0x8B];

/// Single file gzip codec.
#[derive(Debug, Clone)]
pub struct GzipCompression {
    level: u32,
    keep_original: bool,
}

impl Default for GzipCompression {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            keep_original: false,
        }
    }
}

impl GzipCompression {
    pub fn new(level: u32, keep_original: bool) -> Self {
        Self {
            level,
            keep_original,
        }
    }

    fn effective_level(&self, options: CompressionOptions) -> u32 {
        options.level.unwrap_or(self.level).clamp(1, 9)
    }

    fn keep_original(&self, options: CompressionOptions) -> bool {
        options.keep_original.unwrap_or(self.keep_original)
    }
}

#[async_trait]
impl CompressionAdapter for GzipCompression {
    fn name(&self) -> &str {
        "gzip"
    }

    fn extension(&self) -> &str {
        "gz"
    }

    fn magic(&self) -> &'static [u8] {
        GZIP_MAGIC
    }

    async fn compress(
        &self,
        source: &Path,
        target: Option<&Path>,
        options: CompressionOptions,
    ) -> Result<PathBuf, Error> {
        if !source.is_file() {
            Err(CompressionError::unsupported_source(source))?
        }
        let target = target
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.compress_target(source));
        let level = self.effective_level(options);

        let (source_path, target_path) = (source.to_path_buf(), target.clone());
        run_blocking(move || {
            let staging = staging_path(&target_path);
            gzip_file(&source_path, &staging, level)
                .and_then(|()| publish(&staging, &target_path))
                .map_err(|err| {
                    remove_partial(&staging);
                    CompressionError::compress_failed(&source_path, err).into()
                })
        })
        .await?;

        if !self.keep_original(options) {
            remove_source(source).await?;
        }
        Ok(target)
    }

    async fn decompress(
        &self,
        source: &Path,
        target: Option<&Path>,
        options: CompressionOptions,
    ) -> Result<PathBuf, Error> {
        let target = target
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.decompress_target(source));

        let (source_path, target_path) = (source.to_path_buf(), target.clone());
        run_blocking(move || {
            let staging = staging_path(&target_path);
            gunzip_file(&source_path, &staging)
                .and_then(|()| publish(&staging, &target_path))
                .map_err(|err| {
                    remove_partial(&staging);
                    CompressionError::decompress_failed(&source_path, err).into()
                })
        })
        .await?;

        if !self.keep_original(options) {
            remove_source(source).await?;
        }
        Ok(target)
    }
}

fn gzip_file(source: &Path, target: &Path, level: u32) -> io::Result<()> {
    let mut input = BufReader::new(File::open(source)?);
    let output = BufWriter::new(File::create(target)?);
    let mut encoder = GzEncoder::new(output, Compression::new(level));
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.flush()
}

fn gunzip_file(source: &Path, target: &Path) -> io::Result<()> {
    let mut decoder = GzDecoder::new(BufReader::new(File::open(source)?));
    let mut output = BufWriter::new(File::create(target)?);
    io::copy(&mut decoder, &mut output)?;
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn keep() -> CompressionOptions {
        CompressionOptions {
            keep_original: Some(true),
            ..CompressionOptions::default()
        }
    }

    #[tokio::test]
    async fn compress_replaces_source_by_default() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dump.sql");
        std::fs::write(&source, "CREATE TABLE t (id INT);\n".repeat(100)).unwrap();
        let gzip = GzipCompression::default();

        let compressed = gzip.compress(&source, None, CompressionOptions::default()).await.unwrap();

        assert_eq!(compressed, dir.path().join("dump.sql.gz"));
        assert!(!source.exists());
        assert_eq!(&std::fs::read(&compressed).unwrap()[..2], GZIP_MAGIC);

        let restored = gzip.decompress(&compressed, None, keep()).await.unwrap();
        assert_eq!(restored, source);
        assert!(compressed.exists());
        assert_eq!(
            std::fs::read_to_string(&restored).unwrap(),
            "CREATE TABLE t (id INT);\n".repeat(100)
        );
    }

    #[tokio::test]
    async fn keep_original_per_call_override() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("notes.txt");
        std::fs::write(&source, "keep me").unwrap();
        let gzip = GzipCompression::new(6, true);

        let options = CompressionOptions {
            level: Some(42),
            keep_original: Some(false),
        };
        gzip.compress(&source, None, options).await.unwrap();

        assert!(!source.exists());
    }

    #[tokio::test]
    async fn decompress_without_extension_appends_suffix() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("payload");
        std::fs::write(&source, "abc").unwrap();
        let gzip = GzipCompression::default();
        let compressed = gzip
            .compress(&source, Some(&dir.path().join("blob")), CompressionOptions::default())
            .await
            .unwrap();

        let restored = gzip.decompress(&compressed, None, keep()).await.unwrap();

        assert_eq!(restored, dir.path().join("blob.decompressed"));
        assert_eq!(std::fs::read_to_string(restored).unwrap(), "abc");
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn missing_source_keeps_existing_default_target() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("important.sql");
        std::fs::write(&existing, "precious").unwrap();
        let gzip = GzipCompression::default();

        let result = gzip
            .decompress(&dir.path().join("important.sql.gz"), None, keep())
            .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "precious");
        assert_eq!(entries(dir.path()), ["important.sql"]);
    }

    #[tokio::test]
    async fn failed_decompress_leaves_directory_target_untouched() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("x.gz");
        std::fs::write(&source, "plain text, not gzip").unwrap();
        let target = dir.path().join("restore");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "keep").unwrap();
        let gzip = GzipCompression::default();

        assert!(gzip.decompress(&source, Some(&target), keep()).await.is_err());

        assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "keep");
        assert_eq!(entries(dir.path()), ["restore", "x.gz"]);
    }

    #[tokio::test]
    async fn failed_decompress_keeps_existing_file_target() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dump.sql.gz");
        std::fs::write(&source, b"\x1F\x8B but truncated").unwrap();
        let target = dir.path().join("dump.sql");
        std::fs::write(&target, "previous dump").unwrap();
        let gzip = GzipCompression::default();

        assert!(gzip.decompress(&source, None, keep()).await.is_err());

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "previous dump");
        assert_eq!(entries(dir.path()), ["dump.sql", "dump.sql.gz"]);
    }

    #[tokio::test]
    async fn compress_onto_a_directory_fails_without_touching_it() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dump.sql");
        std::fs::write(&source, "SELECT 1;").unwrap();
        let target = dir.path().join("occupied");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "keep").unwrap();
        let gzip = GzipCompression::default();

        assert!(gzip.compress(&source, Some(&target), keep()).await.is_err());

        assert!(source.exists());
        assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "keep");
        assert_eq!(entries(dir.path()), ["dump.sql", "occupied"]);
    }

    #[tokio::test]
    async fn directories_are_rejected() {
        let dir = TempDir::new().unwrap();
        let gzip = GzipCompression::default();
        assert!(gzip.compress(dir.path(), None, CompressionOptions::default()).await.is_err());
    }
}
