use crate::interface::storage_adapter::{StorageAdapter, StoredObject, validate_key};
use crate::model::config::StorageConfig;
use crate::model::error::Error;
use crate::model::error::storage::StorageError;
use async_trait::async_trait;
use futures::StreamExt;
use object_store::ObjectStore;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// S3, GCS or in-memory bucket addressed under an optional key prefix.
pub struct ObjectStorage {
    name: String,
    store: Arc<dyn ObjectStore>,
    prefix: String,
}

impl ObjectStorage {
    pub fn new(name: impl Into<String>, store: Arc<dyn ObjectStore>, prefix: Option<&str>) -> Self {
        Self {
            name: name.into(),
            store,
            prefix: prefix.unwrap_or_default().trim_matches('/').to_string(),
        }
    }

    pub fn in_memory(name: impl Into<String>) -> Self {
        Self::new(name, Arc::new(InMemory::new()), None)
    }

    pub fn from_config(config: &StorageConfig) -> Result<Self, Error> {
        match config {
            StorageConfig::S3 {
                name,
                bucket,
                prefix,
                region,
                endpoint,
                access_key_id,
                secret_access_key,
            } => {
                let mut builder = AmazonS3Builder::from_env().with_bucket_name(bucket);
                if let Some(region) = region {
                    builder = builder.with_region(region);
                }
                if let Some(endpoint) = endpoint {
                    builder = builder.with_endpoint(endpoint).with_allow_http(true);
                }
                if let Some(access_key_id) = access_key_id {
                    builder = builder.with_access_key_id(access_key_id);
                }
                if let Some(secret_access_key) = secret_access_key {
                    builder = builder.with_secret_access_key(secret_access_key);
                }
                let store = builder.build().map_err(StorageError::build_client_failed)?;
                Ok(Self::new(name, Arc::new(store), prefix.as_deref()))
            }
            StorageConfig::Gcs {
                name,
                bucket,
                prefix,
                service_account_path,
            } => {
                let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
                if let Some(path) = service_account_path {
                    builder = builder.with_service_account_path(path.to_string_lossy());
                }
                let store = builder.build().map_err(StorageError::build_client_failed)?;
                Ok(Self::new(name, Arc::new(store), prefix.as_deref()))
            }
            StorageConfig::Local { name, .. } => Err(StorageError::build_client_failed(format!(
                "{name} is a local storage"
            ))
            .into()),
        }
    }

    fn location(&self, key: &str) -> Result<ObjectPath, Error> {
        validate_key(key)?;
        let full_key = if self.prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", self.prefix, key)
        };
        Ok(ObjectPath::parse(&full_key).map_err(|_| StorageError::invalid_key(key))?)
    }

    fn relative_key(&self, location: &ObjectPath) -> String {
        let key = location.to_string();
        if self.prefix.is_empty() {
            return key;
        }
        key.strip_prefix(&format!("{}/", self.prefix))
            .map(str::to_string)
            .unwrap_or(key)
    }
}

#[async_trait]
impl StorageAdapter for ObjectStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn store(&self, local_path: &Path, key: &str) -> Result<String, Error> {
        let location = self.location(key)?;
        let data = fs::read(local_path)
            .await
            .map_err(|err| StorageError::store_failed(key, err))?;
        self.store
            .put(&location, data.into())
            .await
            .map_err(|err| StorageError::store_failed(key, err))?;
        Ok(location.to_string())
    }

    async fn retrieve(&self, key: &str, local_path: &Path) -> Result<(), Error> {
        let location = self.location(key)?;
        let data = match self.store.get(&location).await {
            Ok(result) => result
                .bytes()
                .await
                .map_err(|err| StorageError::retrieve_failed(key, err))?,
            Err(object_store::Error::NotFound { .. }) => Err(StorageError::object_not_found(key))?,
            Err(err) => Err(StorageError::retrieve_failed(key, err))?,
        };
        if let Err(err) = fs::write(local_path, &data).await {
            let _ = fs::remove_file(local_path).await;
            Err(StorageError::retrieve_failed(key, err))?
        }
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let location = self.location(key)?;
        match self.store.delete(&location).await {
            Ok(()) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(err) => Err(StorageError::delete_failed(key, err).into()),
        }
    }

    async fn list(&self) -> Result<Vec<StoredObject>, Error> {
        let prefix = if self.prefix.is_empty() {
            None
        } else {
            Some(ObjectPath::from(self.prefix.as_str()))
        };
        let mut stream = self.store.list(prefix.as_ref());
        let mut objects = Vec::new();
        while let Some(meta) = stream.next().await {
            let meta = meta.map_err(StorageError::list_failed)?;
            objects.push(StoredObject {
                key: self.relative_key(&meta.location),
                size: meta.size as u64,
                last_modified: Some(meta.last_modified),
            });
        }
        Ok(objects)
    }

    async fn exists(&self, key: &str) -> Result<bool, Error> {
        Ok(self.size(key).await?.is_some())
    }

    async fn size(&self, key: &str) -> Result<Option<u64>, Error> {
        let location = self.location(key)?;
        match self.store.head(&location).await {
            Ok(meta) => Ok(Some(meta.size as u64)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(err) => Err(StorageError::retrieve_failed(key, err).into()),
        }
    }
}
