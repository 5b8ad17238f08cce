use crate::interface::ThreadSafe;
use crate::model::error::Error;
use crate::model::error::storage::StorageError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub key: String,
    pub size: u64,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Durable blob storage addressed by key.
///
/// `store` is all or nothing, and deleting an absent key succeeds.
#[async_trait]
pub trait StorageAdapter: ThreadSafe {
    fn name(&self) -> &str;

    /// Uploads the local file under `key` and returns where it landed.
    async fn store(&self, local_path: &Path, key: &str) -> Result<String, Error>;

    async fn retrieve(&self, key: &str, local_path: &Path) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;

    async fn list(&self) -> Result<Vec<StoredObject>, Error>;

    async fn exists(&self, key: &str) -> Result<bool, Error>;

    async fn size(&self, key: &str) -> Result<Option<u64>, Error>;
}

pub fn validate_key(key: &str) -> Result<(), Error> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..");
    if invalid {
        Err(StorageError::invalid_key(key))?
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_escaping_keys() {
        assert!(validate_key("nightly_20260101.tar.zip").is_ok());
        assert!(validate_key("daily/nightly.tar.gz").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("../etc/passwd").is_err());
        assert!(validate_key("/absolute").is_err());
        assert!(validate_key("a//b").is_err());
    }
}
