pub mod local;
pub mod object;

use crate::core::storage::local::LocalStorage;
use crate::core::storage::object::ObjectStorage;
use crate::interface::storage_adapter::StorageAdapter;
use crate::model::config::StorageConfig;
use crate::model::error::Error;
use std::sync::Arc;

pub fn build_storage(config: &StorageConfig) -> Result<Arc<dyn StorageAdapter>, Error> {
    let storage: Arc<dyn StorageAdapter> = match config {
        StorageConfig::Local { name, path } => Arc::new(LocalStorage::new(name, path)),
        StorageConfig::S3 { .. } | StorageConfig::Gcs { .. } => {
            Arc::new(ObjectStorage::from_config(config)?)
        }
    };
    Ok(storage)
}
