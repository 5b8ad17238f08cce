use crate::model::backup_configuration::{BackupConfiguration, DEFAULT_STORAGE};
use crate::model::backup_schedule::Frequency;
use crate::model::connection::ConnectionDescriptor;
use crate::model::hash_type::HashType;
use crate::model::retention::RetentionPolicy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
pub struct ConfigTable {
    #[serde(rename = "Config")]
    pub config: Config,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub backup_dir: PathBuf,
    pub index_path: PathBuf,
    #[serde(default = "default_storage")]
    pub default_storage: String,
    #[serde(default = "default_command_timeout")]
    pub command_timeout: u64, // second
    #[serde(default = "default_event_timeout")]
    pub event_timeout: u64, // second
    #[serde(default = "default_wakeup_time")]
    pub default_wakeup_time: i64, // second
    #[serde(default)]
    pub strict_resolution: bool,
    #[serde(default)]
    pub checksum: Option<HashType>,
    #[serde(default)]
    pub compression: CompressionConfig,
    #[serde(default)]
    pub storages: Vec<StorageConfig>,
    #[serde(default)]
    pub databases: Vec<DatabaseConfig>,
    #[serde(default)]
    pub schedules: Vec<ScheduleConfig>,
    #[serde(default)]
    pub retention: Option<RetentionPolicy>,
}

fn default_storage() -> String {
    DEFAULT_STORAGE.to_string()
}

fn default_command_timeout() -> u64 {
    3600
}

fn default_event_timeout() -> u64 {
    5
}

fn default_wakeup_time() -> i64 {
    60
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct CompressionConfig {
    #[serde(default = "default_gzip_level")]
    pub gzip_level: u32,
    #[serde(default = "default_zip_level")]
    pub zip_level: u32,
    #[serde(default)]
    pub keep_original: bool,
}

fn default_gzip_level() -> u32 {
    6
}

fn default_zip_level() -> u32 {
    6
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            gzip_level: default_gzip_level(),
            zip_level: default_zip_level(),
            keep_original: false,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StorageConfig {
    Local {
        name: String,
        path: PathBuf,
    },
    S3 {
        name: String,
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        region: Option<String>,
        #[serde(default)]
        endpoint: Option<String>,
        #[serde(default)]
        access_key_id: Option<String>,
        #[serde(default)]
        secret_access_key: Option<String>,
    },
    Gcs {
        name: String,
        bucket: String,
        #[serde(default)]
        prefix: Option<String>,
        #[serde(default)]
        service_account_path: Option<PathBuf>,
    },
}

impl StorageConfig {
    pub fn name(&self) -> &str {
        match self {
            StorageConfig::Local { name, .. }
            | StorageConfig::S3 { name, .. }
            | StorageConfig::Gcs { name, .. } => name,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    /// Concrete engine token of the adapter to build.
    pub engine: String,
    #[serde(flatten)]
    pub connection: ConnectionDescriptor,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ScheduleConfig {
    pub name: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub first_run: Option<DateTime<Utc>>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    pub backup: BackupConfiguration,
}

fn default_enabled() -> bool {
    true
}
