pub mod gzip;
pub mod zip;

use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf, is_separator};
use uuid::Uuid;

pub const DEFAULT_LEVEL: u32 = 6;

pub(crate) async fn run_blocking<T, F>(task: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(SystemError::thread_panic)?
}

/// Sibling of `target` a codec writes into before moving the output in place.
pub(crate) fn staging_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    target.with_file_name(format!(".{name}.{}.partial", Uuid::new_v4().simple()))
}

/// Deletes a staging path, file or directory.
pub(crate) fn remove_partial(path: &Path) {
    let removed = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(err) = removed {
        if err.kind() != ErrorKind::NotFound {
            IOError::delete_file_failed(path, err).log();
        }
    }
}

/// Moves a staged file or tree to `target`.
///
/// An existing target directory receives the staged entries; entries it
/// already had are kept unless the staged tree replaces them. A failed merge
/// removes every path it created before returning the error.
pub(crate) fn publish(staged: &Path, target: &Path) -> io::Result<()> {
    if !(staged.is_dir() && target.is_dir()) {
        return fs::rename(staged, target);
    }
    let mut created = Vec::new();
    let merged = merge_entries(staged, target, &mut created);
    if merged.is_err() {
        for path in created.iter().rev() {
            remove_partial(path);
        }
    }
    merged
}

fn merge_entries(from: &Path, to: &Path, created: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in fs::read_dir(from)? {
        let entry = entry?;
        let destination = to.join(entry.file_name());
        if entry.file_type()?.is_dir() && destination.is_dir() {
            merge_entries(&entry.path(), &destination, created)?;
            continue;
        }
        let existed = fs::symlink_metadata(&destination).is_ok();
        fs::rename(entry.path(), &destination)?;
        if !existed {
            created.push(destination);
        }
    }
    Ok(())
}

pub(crate) async fn remove_source(path: &Path) -> Result<(), Error> {
    let removed = if path.is_dir() {
        tokio::fs::remove_dir_all(path)
            .await
            .map_err(|err| IOError::delete_directory_failed(path, err))
    } else {
        tokio::fs::remove_file(path)
            .await
            .map_err(|err| IOError::delete_file_failed(path, err))
    };
    Ok(removed?)
}

pub(crate) fn names_directory(path: &Path) -> bool {
    path.is_dir()
        || path
            .as_os_str()
            .to_string_lossy()
            .ends_with(is_separator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn staging_path_is_a_hidden_sibling() {
        let target = Path::new("/var/backups/dump.sql");
        let staging = staging_path(target);

        assert_eq!(staging.parent(), target.parent());
        let name = staging.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".dump.sql.") && name.ends_with(".partial"));
        assert_ne!(staging, staging_path(target));
    }

    #[test]
    fn publish_merges_into_an_existing_directory() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        fs::create_dir_all(target.join("docs")).unwrap();
        fs::write(target.join("keep.txt"), "keep").unwrap();
        fs::write(target.join("docs/old.txt"), "old").unwrap();
        let staged = staging_path(&target);
        fs::create_dir_all(staged.join("docs")).unwrap();
        fs::write(staged.join("docs/new.txt"), "new").unwrap();

        publish(&staged, &target).unwrap();

        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "keep");
        assert_eq!(fs::read_to_string(target.join("docs/old.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(target.join("docs/new.txt")).unwrap(), "new");
    }

    #[cfg(unix)]
    #[test]
    fn failed_merge_removes_only_what_it_moved() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("out");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("keep.txt"), "keep").unwrap();
        fs::write(target.join("b"), "a file where the archive has a directory").unwrap();
        let staged = staging_path(&target);
        fs::create_dir_all(staged.join("b")).unwrap();
        fs::write(staged.join("a.txt"), "alpha").unwrap();
        fs::write(staged.join("b/inner.txt"), "inner").unwrap();

        assert!(publish(&staged, &target).is_err());

        assert!(!target.join("a.txt").exists());
        assert_eq!(fs::read_to_string(target.join("keep.txt")).unwrap(), "keep");
        assert!(target.join("b").is_file());
    }
}
