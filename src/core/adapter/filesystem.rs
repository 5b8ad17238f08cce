use crate::core::adapter::{artifact_path, finish, or_discard, validate_output};
use crate::core::compression::run_blocking;
use crate::interface::backup_adapter::BackupAdapter;
use crate::model::backup_configuration::{BackupConfiguration, Options, option_str, options_as};
use crate::model::backup_result::BackupResult;
use crate::model::backup_type::{FILESYSTEM, normalize};
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::error::io::IOError;
use crate::utils::glob;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const TARGET_DIR_OPTION: &str = "target_dir";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PathEntry {
    Plain(PathBuf),
    Detailed {
        path: PathBuf,
        #[serde(default)]
        exclude: Vec<String>,
    },
}

impl PathEntry {
    fn path(&self) -> &Path {
        match self {
            PathEntry::Plain(path) | PathEntry::Detailed { path, .. } => path,
        }
    }

    fn exclude(&self) -> &[String] {
        match self {
            PathEntry::Plain(_) => &[],
            PathEntry::Detailed { exclude, .. } => exclude,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FilesystemOptions {
    #[serde(default)]
    paths: Vec<PathEntry>,
}

/// One archived root with the prefix its entries get inside the archive.
struct SourceRoot {
    path: PathBuf,
    prefix: Option<PathBuf>,
    exclusions: Vec<String>,
}

#[derive(Debug, Default)]
struct ArchiveStats {
    files: u64,
    excluded: u64,
}

/// Archives directories into a tar file and unpacks it into a target directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct FilesystemAdapter;

impl FilesystemAdapter {
    fn source_roots(configuration: &BackupConfiguration) -> Result<Vec<SourceRoot>, Error> {
        let options: FilesystemOptions = options_as(&configuration.options)?;
        let single = options.paths.len() == 1;
        let mut taken = HashSet::new();
        let roots = options
            .paths
            .iter()
            .map(|entry| {
                let mut exclusions = configuration.exclusions.clone();
                exclusions.extend_from_slice(entry.exclude());
                let prefix = (!single).then(|| unique_prefix(entry.path(), &mut taken));
                SourceRoot {
                    path: entry.path().to_path_buf(),
                    prefix,
                    exclusions,
                }
            })
            .collect();
        Ok(roots)
    }
}

fn unique_prefix(path: &Path, taken: &mut HashSet<String>) -> PathBuf {
    let base = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let mut candidate = base.clone();
    let mut counter = 1;
    while !taken.insert(candidate.clone()) {
        counter += 1;
        candidate = format!("{base}-{counter}");
    }
    PathBuf::from(candidate)
}

fn relative_name(relative: &Path) -> String {
    relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn is_excluded(exclusions: &[String], relative: &Path) -> bool {
    let relative_name = relative_name(relative);
    let file_name = relative
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    glob::matches_any(exclusions, &relative_name) || glob::matches_any(exclusions, &file_name)
}

fn write_archive(roots: &[SourceRoot], archive: &Path) -> io::Result<ArchiveStats> {
    let mut builder = tar::Builder::new(BufWriter::new(File::create(archive)?));
    builder.follow_symlinks(false);
    let mut stats = ArchiveStats::default();

    for root in roots {
        let entry_name = |relative: &Path| match &root.prefix {
            Some(prefix) => prefix.join(relative),
            None => relative.to_path_buf(),
        };

        if root.path.is_file() {
            let name = root.path.file_name().map(PathBuf::from).unwrap_or_default();
            builder.append_path_with_name(&root.path, entry_name(&name))?;
            stats.files += 1;
            continue;
        }
        if !root.path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", root.path.display()),
            ));
        }
        if let Some(prefix) = &root.prefix {
            builder.append_dir(prefix, &root.path)?;
        }

        let walker = WalkDir::new(&root.path)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                let excluded = entry
                    .path()
                    .strip_prefix(&root.path)
                    .is_ok_and(|relative| is_excluded(&root.exclusions, relative));
                if excluded {
                    stats.excluded += 1;
                }
                !excluded
            });
        for entry in walker {
            let entry = entry.map_err(io::Error::from)?;
            let relative = entry.path().strip_prefix(&root.path).map_err(io::Error::other)?;
            let name = entry_name(relative);
            if entry.file_type().is_dir() {
                builder.append_dir(&name, entry.path())?;
            } else {
                builder.append_path_with_name(entry.path(), &name)?;
                stats.files += 1;
            }
        }
    }

    builder.into_inner()?.flush()?;
    Ok(stats)
}

fn unpack_archive(archive: &Path, target: &Path) -> io::Result<()> {
    std::fs::create_dir_all(target)?;
    let mut archive = tar::Archive::new(BufReader::new(File::open(archive)?));
    archive.set_preserve_permissions(true);
    archive.unpack(target)
}

#[async_trait]
impl BackupAdapter for FilesystemAdapter {
    fn name(&self) -> &str {
        FILESYSTEM
    }

    fn supports(&self, backup_type: &str) -> bool {
        normalize(backup_type) == FILESYSTEM
    }

    fn validate(&self, configuration: &BackupConfiguration) -> Vec<String> {
        let mut problems = Vec::new();
        validate_output(configuration, &mut problems);
        match options_as::<FilesystemOptions>(&configuration.options) {
            Ok(options) if options.paths.is_empty() => {
                problems.push("no paths configured".to_string());
            }
            Ok(options) => {
                for entry in options.paths {
                    if entry.path().as_os_str().is_empty() {
                        problems.push("path entry is empty".to_string());
                    }
                }
            }
            Err(err) => problems.push(err.to_string()),
        }
        problems
    }

    async fn backup(
        &self,
        configuration: &BackupConfiguration,
        stem: &Path,
    ) -> Result<BackupResult, Error> {
        let roots = Self::source_roots(configuration)?;
        let archive = artifact_path(stem, "tar");
        let paths: Vec<String> = roots
            .iter()
            .map(|root| root.path.display().to_string())
            .collect();
        let exclusions: Vec<String> = roots
            .iter()
            .flat_map(|root| root.exclusions.iter().cloned())
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let archive_path = archive.clone();
        let stats = or_discard(
            &archive,
            run_blocking(move || {
                write_archive(&roots, &archive_path)
                    .map_err(|err| AdapterError::archive_failed(err).into())
            }),
        )
        .await?;

        let mut result = finish(&archive, FILESYSTEM).await?;
        result.insert_metadata("paths", json!(paths));
        result.insert_metadata("exclusions", json!(exclusions));
        result.insert_metadata("files", stats.files);
        result.insert_metadata("excluded_entries", stats.excluded);
        Ok(result)
    }

    async fn restore(&self, file_path: &Path, options: &Options) -> Result<(), Error> {
        let Some(target) = option_str(options, TARGET_DIR_OPTION) else {
            return Err(AdapterError::missing_option(TARGET_DIR_OPTION).into());
        };
        if !file_path.is_file() {
            Err(IOError::file_does_not_exist(file_path))?
        }
        let (archive, target) = (file_path.to_path_buf(), PathBuf::from(target));
        run_blocking(move || {
            unpack_archive(&archive, &target)
                .map_err(|err| AdapterError::extract_failed(target.clone(), err).into())
        })
        .await
    }
}
