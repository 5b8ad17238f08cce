use crate::core::compression::{
    DEFAULT_LEVEL, names_directory, publish, remove_partial, remove_source, run_blocking,
    staging_path,
};
use crate::interface::compression_adapter::{CompressionAdapter, CompressionOptions};
use crate::model::error::Error;
use crate::model::error::compression::CompressionError;
use async_trait::async_trait;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const ZIP_MAGIC: &[u8] = &[0x50, 0x4B, 0x03, 0x04];

/// Zip codec. Files become a single entry, directories are archived by content.
#[derive(Debug, Clone)]
pub struct ZipCompression {
    level: u32,
    keep_original: bool,
}

impl Default for ZipCompression {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            keep_original: false,
        }
    }
}

impl ZipCompression {
    pub fn new(level: u32, keep_original: bool) -> Self {
        Self {
            level,
            keep_original,
        }
    }

    fn file_options(&self, options: CompressionOptions) -> SimpleFileOptions {
        let level = options.level.unwrap_or(self.level).min(9);
        if level == 0 {
            SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
        } else {
            SimpleFileOptions::default()
                .compression_method(CompressionMethod::Deflated)
                .compression_level(Some(level as i64))
        }
    }

    fn keep_original(&self, options: CompressionOptions) -> bool {
        options.keep_original.unwrap_or(self.keep_original)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractMode {
    /// Single file archives extract to a file, anything else (an empty
    /// archive included) to a directory.
    Auto,
    Directory,
    FirstEntry,
}

enum UnzipFailure {
    Empty,
    Zip(ZipError),
}

impl From<ZipError> for UnzipFailure {
    fn from(err: ZipError) -> Self {
        UnzipFailure::Zip(err)
    }
}

impl From<io::Error> for UnzipFailure {
    fn from(err: io::Error) -> Self {
        UnzipFailure::Zip(err.into())
    }
}

#[async_trait]
impl CompressionAdapter for ZipCompression {
    fn name(&self) -> &str {
        "zip"
    }

    fn extension(&self) -> &str {
        "zip"
    }

    fn magic(&self) -> &'static [u8] {
        ZIP_MAGIC
    }

    async fn compress(
        &self,
        source: &Path,
        target: Option<&Path>,
        options: CompressionOptions,
    ) -> Result<PathBuf, Error> {
        if !source.exists() {
            Err(CompressionError::unsupported_source(source))?
        }
        let target = target
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.compress_target(source));
        let file_options = self.file_options(options);

        let (source_path, target_path) = (source.to_path_buf(), target.clone());
        run_blocking(move || {
            let staging = staging_path(&target_path);
            zip_path(&source_path, &staging, file_options)
                .and_then(|()| Ok(publish(&staging, &target_path)?))
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

    /// An explicit target naming a directory receives every entry, any other
    /// explicit target receives the first file entry. Entries are extracted
    /// next to the target first, so a failure never touches what the target
    /// held before.
    async fn decompress(
        &self,
        source: &Path,
        target: Option<&Path>,
        options: CompressionOptions,
    ) -> Result<PathBuf, Error> {
        let (target, mode) = match target {
            Some(target) if names_directory(target) => (target.to_path_buf(), ExtractMode::Directory),
            Some(target) => (target.to_path_buf(), ExtractMode::FirstEntry),
            None => (self.decompress_target(source), ExtractMode::Auto),
        };

        let (source_path, target_path) = (source.to_path_buf(), target.clone());
        run_blocking(move || {
            let staging = staging_path(&target_path);
            let extracted = unzip_path(&source_path, &staging, mode)
                .and_then(|()| Ok(publish(&staging, &target_path)?));
            remove_partial(&staging);
            extracted.map_err(|err| match err {
                UnzipFailure::Empty => CompressionError::empty_archive(&source_path).into(),
                UnzipFailure::Zip(err) => CompressionError::decompress_failed(&source_path, err).into(),
            })
        })
        .await?;

        if !self.keep_original(options) {
            remove_source(source).await?;
        }
        Ok(target)
    }
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn zip_path(source: &Path, target: &Path, options: SimpleFileOptions) -> Result<(), ZipError> {
    let mut writer = ZipWriter::new(BufWriter::new(File::create(target)?));
    if source.is_dir() {
        for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry.path().strip_prefix(source).map_err(io::Error::other)?;
            let name = entry_name(relative);
            if entry.file_type().is_dir() {
                writer.add_directory(name, options)?;
            } else if entry.file_type().is_file() {
                writer.start_file(name, options)?;
                io::copy(&mut BufReader::new(File::open(entry.path())?), &mut writer)?;
            }
        }
    } else {
        let name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "data".to_string());
        writer.start_file(name, options)?;
        io::copy(&mut BufReader::new(File::open(source)?), &mut writer)?;
    }
    writer.finish()?.flush()?;
    Ok(())
}

fn unzip_path(source: &Path, target: &Path, mode: ExtractMode) -> Result<(), UnzipFailure> {
    let mut archive = ZipArchive::new(BufReader::new(File::open(source)?))?;
    let mode = match mode {
        ExtractMode::Auto if archive.len() == 0 => ExtractMode::Directory,
        ExtractMode::Auto => {
            let single_file = archive.len() == 1 && archive.by_index(0)?.is_file();
            if single_file {
                ExtractMode::FirstEntry
            } else {
                ExtractMode::Directory
            }
        }
        mode => mode,
    };

    if mode == ExtractMode::Directory {
        std::fs::create_dir_all(target)?;
        archive.extract(target)?;
        return Ok(());
    }

    let index = (0..archive.len())
        .find(|&index| {
            archive
                .by_index(index)
                .map(|entry| entry.is_file())
                .unwrap_or(false)
        })
        .ok_or(UnzipFailure::Empty)?;
    let mut entry = archive.by_index(index)?;
    if let Some(parent) = target.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut output = BufWriter::new(File::create(target)?);
    io::copy(&mut entry, &mut output)?;
    output.flush()?;
    Ok(())
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

    fn tree(root: &Path) {
        std::fs::create_dir_all(root.join("docs/deep")).unwrap();
        std::fs::write(root.join("readme.md"), "top").unwrap();
        std::fs::write(root.join("docs/deep/notes.txt"), "deep").unwrap();
    }

    fn entry_names(archive: &Path) -> Vec<String> {
        let archive = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn directory_contents_without_top_level_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("site");
        tree(&source);
        let zip = ZipCompression::default();

        let archive = zip.compress(&source, None, keep()).await.unwrap();

        assert_eq!(archive, dir.path().join("site.zip"));
        assert_eq!(
            entry_names(&archive),
            vec!["docs/", "docs/deep/", "docs/deep/notes.txt", "readme.md"]
        );
    }

    #[tokio::test]
    async fn directory_target_extracts_everything() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("site");
        tree(&source);
        let zip = ZipCompression::default();
        let archive = zip.compress(&source, None, CompressionOptions::default()).await.unwrap();
        assert!(!source.exists());

        let out = dir.path().join("restored");
        std::fs::create_dir_all(&out).unwrap();
        let extracted = zip.decompress(&archive, Some(&out), keep()).await.unwrap();

        assert_eq!(extracted, out);
        assert_eq!(std::fs::read_to_string(out.join("docs/deep/notes.txt")).unwrap(), "deep");
        assert_eq!(std::fs::read_to_string(out.join("readme.md")).unwrap(), "top");
    }

    #[tokio::test]
    async fn file_target_takes_first_entry_under_new_name() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("dump.sql");
        std::fs::write(&source, "SELECT 1;").unwrap();
        let zip = ZipCompression::new(0, false);
        let archive = zip.compress(&source, None, CompressionOptions::default()).await.unwrap();

        let target = dir.path().join("renamed.sql");
        let extracted = zip.decompress(&archive, Some(&target), keep()).await.unwrap();

        assert_eq!(extracted, target);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "SELECT 1;");
    }

    #[tokio::test]
    async fn default_target_of_single_file_archive_is_a_file() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("nightly.tar");
        std::fs::write(&source, b"tarball").unwrap();
        let zip = ZipCompression::default();
        let archive = zip.compress(&source, None, CompressionOptions::default()).await.unwrap();

        let extracted = zip.decompress(&archive, None, CompressionOptions::default()).await.unwrap();

        assert_eq!(extracted, source);
        assert!(extracted.is_file());
        assert!(!archive.exists());
    }

    #[tokio::test]
    async fn corrupt_archive_leaves_nothing_behind() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.zip");
        std::fs::write(&source, b"PK\x03\x04 definitely not a zip").unwrap();
        let zip = ZipCompression::default();

        let result = zip.decompress(&source, None, keep()).await;

        assert!(result.is_err());
        assert!(!dir.path().join("broken").exists());
        assert_eq!(dir_names(dir.path()), ["broken.zip"]);
        assert!(zip.supports(&source).await);
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn empty_directory_round_trips() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("emptydir");
        std::fs::create_dir_all(&source).unwrap();
        let zip = ZipCompression::default();

        let archive = zip.compress(&source, None, CompressionOptions::default()).await.unwrap();
        assert!(!source.exists());
        assert!(entry_names(&archive).is_empty());

        let extracted = zip.decompress(&archive, None, CompressionOptions::default()).await.unwrap();

        assert_eq!(extracted, source);
        assert!(extracted.is_dir());
        assert!(dir_names(&extracted).is_empty());
        assert_eq!(dir_names(dir.path()), ["emptydir"]);
    }

    #[tokio::test]
    async fn empty_archive_has_no_first_entry() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("emptydir");
        std::fs::create_dir_all(&source).unwrap();
        let zip = ZipCompression::default();
        let archive = zip.compress(&source, None, CompressionOptions::default()).await.unwrap();

        let target = dir.path().join("first.txt");
        let result = zip.decompress(&archive, Some(&target), keep()).await;

        assert!(result.unwrap_err().to_string().contains("no entries"));
        assert!(!target.exists());
        assert_eq!(dir_names(dir.path()), ["emptydir.zip"]);
    }

    #[tokio::test]
    async fn missing_source_keeps_existing_target() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("site");
        std::fs::create_dir_all(&existing).unwrap();
        std::fs::write(existing.join("keep.txt"), "keep").unwrap();
        let zip = ZipCompression::default();

        let result = zip.decompress(&dir.path().join("site.zip"), None, keep()).await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(existing.join("keep.txt")).unwrap(), "keep");
        assert_eq!(dir_names(dir.path()), ["site"]);
    }

    #[tokio::test]
    async fn failed_compress_keeps_existing_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("site.zip");
        std::fs::write(&archive, "previous archive").unwrap();
        let zip = ZipCompression::default();

        let result = zip
            .compress(&dir.path().join("site"), Some(&archive), CompressionOptions::default())
            .await;

        assert!(result.is_err());
        assert_eq!(std::fs::read_to_string(&archive).unwrap(), "previous archive");
        assert_eq!(dir_names(dir.path()), ["site.zip"]);
    }

    #[tokio::test]
    async fn corrupt_entry_leaves_existing_directory_as_it_was() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("site");
        std::fs::create_dir_all(&source).unwrap();
        std::fs::write(source.join("a.txt"), "alpha-alpha-alpha").unwrap();
        std::fs::write(source.join("b.txt"), "bravo-bravo-bravo").unwrap();
        let zip = ZipCompression::new(0, false);
        let archive = zip.compress(&source, None, CompressionOptions::default()).await.unwrap();

        let mut bytes = std::fs::read(&archive).unwrap();
        let at = bytes
            .windows(17)
            .position(|window| window == b"bravo-bravo-bravo")
            .unwrap();
        bytes[at..at + 17].copy_from_slice(b"BRAVO-BRAVO-BRAVO");
        std::fs::write(&archive, bytes).unwrap();

        let target = dir.path().join("restore");
        std::fs::create_dir_all(&target).unwrap();
        std::fs::write(target.join("keep.txt"), "keep").unwrap();

        assert!(zip.decompress(&archive, Some(&target), keep()).await.is_err());

        assert_eq!(dir_names(&target), ["keep.txt"]);
        assert_eq!(dir_names(dir.path()), ["restore", "site.zip"]);
    }
}
