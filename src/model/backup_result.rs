use crate::model::backup_configuration::{BackupConfiguration, Options};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Outcome of one backup attempt.
///
/// Built once per attempt; the setters only exist for the code assembling
/// the result, nothing mutates a result after it has been returned.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupResult {
    id: Uuid,
    success: bool,
    file_path: Option<String>,
    file_size: Option<u64>,
    created_at: DateTime<Utc>,
    duration: Option<f64>,
    error: Option<String>,
    metadata: Options,
}

impl BackupResult {
    fn new(success: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            success,
            file_path: None,
            file_size: None,
            created_at: Utc::now(),
            duration: None,
            error: None,
            metadata: Options::new(),
        }
    }

    pub fn success(file_path: impl Into<String>, file_size: Option<u64>) -> Self {
        let mut result = Self::new(true);
        result.file_path = Some(file_path.into());
        result.file_size = file_size;
        result
    }

    pub fn failure(error: impl Into<String>) -> Self {
        let mut result = Self::new(false);
        result.error = Some(error.into());
        result
    }

    /// Keeps the identity and timestamp of an attempt whose outcome is decided later.
    pub fn pending() -> Self {
        Self::new(false)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file_path.as_deref()
    }

    pub fn file_size(&self) -> Option<u64> {
        self.file_size
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn metadata(&self) -> &Options {
        &self.metadata
    }

    pub fn set_succeeded(&mut self, file_path: impl Into<String>, file_size: Option<u64>) {
        self.success = true;
        self.error = None;
        self.file_path = Some(file_path.into());
        self.file_size = file_size;
    }

    pub fn set_failed(&mut self, error: impl Into<String>) {
        self.success = false;
        self.error = Some(error.into());
        self.file_path = None;
        self.file_size = None;
    }

    pub fn set_duration(&mut self, seconds: f64) {
        self.duration = Some(seconds);
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metadata.insert(key.into(), value.into());
    }

    pub fn extend_metadata(&mut self, metadata: Options) {
        self.metadata.extend(metadata);
    }
}

/// A stored backup as kept in the index.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupRecord {
    pub id: Uuid,
    pub name: String,
    /// Effective type the backup ran with.
    pub backup_type: String,
    pub storage: String,
    pub compression: Option<String>,
    /// Storage key of the artifact.
    pub file_path: String,
    pub file_size: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub duration: Option<f64>,
    pub metadata: Options,
}

impl BackupRecord {
    /// `None` for results that did not produce a stored artifact.
    pub fn from_result(
        configuration: &BackupConfiguration,
        backup_type: &str,
        result: &BackupResult,
    ) -> Option<Self> {
        if !result.is_success() {
            return None;
        }
        Some(Self {
            id: result.id(),
            name: configuration.name.clone(),
            backup_type: backup_type.to_string(),
            storage: configuration.storage.clone(),
            compression: configuration.compression.clone(),
            file_path: result.file_path()?.to_string(),
            file_size: result.file_size(),
            created_at: result.created_at(),
            duration: result.duration(),
            metadata: result.metadata().clone(),
        })
    }

    /// Rebuilds the configuration the backup was created with, for restore events.
    pub fn to_configuration(&self) -> BackupConfiguration {
        BackupConfiguration {
            backup_type: self.backup_type.clone(),
            name: self.name.clone(),
            storage: self.storage.clone(),
            compression: self.compression.clone(),
            ..BackupConfiguration::default()
        }
    }

    pub fn checksum(&self) -> Option<&str> {
        self.metadata.get("checksum").and_then(Value::as_str)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageUsageEntry {
    pub indexed_count: usize,
    pub indexed_size: u64,
    /// Sum of object sizes reported by the adapter, absent when listing failed.
    pub reported_size: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageUsage {
    pub backup_count: usize,
    pub total_size: u64,
    pub storages: BTreeMap<String, StorageUsageEntry>,
}
