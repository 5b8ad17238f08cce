use crate::interface::storage_adapter::{StorageAdapter, StoredObject, validate_key};
use crate::model::error::Error;
use crate::model::error::storage::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReadDirStream;

const PARTIAL_SUFFIX: &str = ".partial";

/// Stores objects as files below a root directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    name: String,
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, Error> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageAdapter for LocalStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn store(&self, local_path: &Path, key: &str) -> Result<String, Error> {
        let destination = self.path_for(key)?;
        let parent = destination.parent().unwrap_or(&self.root).to_path_buf();
        fs::create_dir_all(&parent)
            .await
            .map_err(|err| StorageError::store_failed(key, err))?;

        // Hidden sibling, renamed into place once complete.
        let partial = parent.join(format!(".{}{PARTIAL_SUFFIX}", Uuid::new_v4().simple()));
        if let Err(err) = fs::copy(local_path, &partial).await {
            let _ = fs::remove_file(&partial).await;
            Err(StorageError::store_failed(key, err))?
        }
        if let Err(err) = fs::rename(&partial, &destination).await {
            let _ = fs::remove_file(&partial).await;
            Err(StorageError::store_failed(key, err))?
        }
        Ok(destination.to_string_lossy().into_owned())
    }

    async fn retrieve(&self, key: &str, local_path: &Path) -> Result<(), Error> {
        let source = self.path_for(key)?;
        if !fs::try_exists(&source).await.unwrap_or(false) {
            Err(StorageError::object_not_found(key))?
        }
        if let Some(parent) = local_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| StorageError::retrieve_failed(key, err))?;
        }
        if let Err(err) = fs::copy(&source, local_path).await {
            let _ = fs::remove_file(local_path).await;
            Err(StorageError::retrieve_failed(key, err))?
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::delete_failed(key, err).into()),
        }
    }

    async fn list(&self) -> Result<Vec<StoredObject>, Error> {
        let mut objects = Vec::new();
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let reader = match fs::read_dir(&dir).await {
                Ok(reader) => reader,
                Err(err) if err.kind() == ErrorKind::NotFound && dir == self.root => break,
                Err(err) => return Err(StorageError::list_failed(err).into()),
            };
            let mut entries = ReadDirStream::new(reader);
            while let Some(entry) = entries.next().await {
                let entry = entry.map_err(StorageError::list_failed)?;
                let metadata = entry.metadata().await.map_err(StorageError::list_failed)?;
                let path = entry.path();
                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !metadata.is_file() || entry.file_name().to_string_lossy().ends_with(PARTIAL_SUFFIX) {
                    continue;
                }
                if let Some(key) = key_for(&self.root, &path) {
                    objects.push(StoredObject {
                        key,
                        size: metadata.len(),
                        last_modified: metadata.modified().ok().map(DateTime::<Utc>::from),
                    });
                }
            }
        }
        objects.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(objects)
    }

    async fn exists(&self, key: &str) -> Result<bool, Error> {
        let path = self.path_for(key)?;
        Ok(fs::metadata(&path).await.is_ok_and(|metadata| metadata.is_file()))
    }

    async fn size(&self, key: &str) -> Result<Option<u64>, Error> {
        let path = self.path_for(key)?;
        match fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => Ok(Some(metadata.len())),
            Ok(_) => Ok(None),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::retrieve_failed(key, err).into()),
        }
    }
}

fn key_for(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let key = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Some(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage(dir: &TempDir) -> LocalStorage {
        LocalStorage::new("local", dir.path().join("store"))
    }

    #[tokio::test]
    async fn store_retrieve_list() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let artifact = dir.path().join("nightly.tar.zip");
        std::fs::write(&artifact, b"archive bytes").unwrap();

        let location = storage.store(&artifact, "nightly.tar.zip").await.unwrap();
        assert!(location.ends_with("nightly.tar.zip"));
        assert!(storage.exists("nightly.tar.zip").await.unwrap());
        assert_eq!(storage.size("nightly.tar.zip").await.unwrap(), Some(13));

        let objects = storage.list().await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "nightly.tar.zip");

        let copy = dir.path().join("work/copy.zip");
        storage.retrieve("nightly.tar.zip", &copy).await.unwrap();
        assert_eq!(std::fs::read(&copy).unwrap(), b"archive bytes");
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let artifact = dir.path().join("a.sql");
        std::fs::write(&artifact, b"x").unwrap();
        storage.store(&artifact, "a.sql").await.unwrap();

        storage.delete("a.sql").await.unwrap();
        storage.delete("a.sql").await.unwrap();
        storage.delete("never-stored.sql").await.unwrap();

        assert!(!storage.exists("a.sql").await.unwrap());
        assert_eq!(storage.size("a.sql").await.unwrap(), None);
    }

    #[tokio::test]
    async fn failed_store_leaves_no_object() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);

        let result = storage.store(&dir.path().join("missing.tar"), "missing.tar").await;

        assert!(result.is_err());
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn retrieve_of_unknown_key_fails() {
        let dir = TempDir::new().unwrap();
        let storage = storage(&dir);
        let target = dir.path().join("out");

        assert!(storage.retrieve("ghost.zip", &target).await.is_err());
        assert!(storage.retrieve("../escape", &target).await.is_err());
        assert!(!target.exists());
    }
}
