use crate::core::driver_resolver;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::core::manager_config::ManagerConfig;
use crate::interface::backup_adapter::BackupAdapter;
use crate::interface::compression_adapter::{CompressionAdapter, CompressionOptions};
use crate::interface::event_sink::EventSink;
use crate::interface::repository::backup_record::BackupRepository;
use crate::interface::storage_adapter::StorageAdapter;
use crate::model::backup_configuration::{BackupConfiguration, Options};
use crate::model::backup_result::{BackupRecord, BackupResult, StorageUsage};
use crate::model::backup_type::{DATABASE, is_generic_database, normalize};
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::error::backup::BackupError;
use crate::model::error::io::IOError;
use crate::model::error::storage::StorageError;
use crate::model::event::{BackupEvent, BackupEventKind};
use crate::model::hash_type::HashType;
use crate::model::log::backup::BackupLog;
use crate::model::log::database::DatabaseLog;
use crate::model::retention::{RetentionPolicy, RetentionReport};
use crate::utils::artifact::{ArtifactCleanup, artifact_stem, default_name};
use crate::utils::file_hash::checksum;
use chrono::{Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use macros::log;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use uuid::Uuid;

/// Runs backup and restore pipelines over the registered adapters and keeps
/// the index of stored backups.
pub struct BackupManager {
    backup_dir: PathBuf,
    adapters: Vec<Arc<dyn BackupAdapter>>,
    storages: HashMap<String, Arc<dyn StorageAdapter>>,
    compressions: HashMap<String, Arc<dyn CompressionAdapter>>,
    default_storage: String,
    event_sink: Option<Arc<dyn EventSink>>,
    database_manager: Option<Arc<DatabaseManager>>,
    strict_resolution: bool,
    checksum: Option<HashType>,
    records: DashMap<Uuid, BackupRecord>,
}

impl BackupManager {
    pub async fn new(config: ManagerConfig) -> Result<Self, Error> {
        let records = DashMap::new();
        if let Some(database_manager) = &config.database_manager {
            let stored = database_manager.get_all_backup_records().await?;
            log!(DatabaseLog::IndexLoaded {
                count: stored.len()
            });
            for record in stored {
                records.insert(record.id, record);
            }
        }
        Ok(Self {
            backup_dir: config.backup_dir,
            adapters: config.adapters,
            storages: config.storages,
            compressions: config.compressions,
            default_storage: config.default_storage,
            event_sink: config.event_sink,
            database_manager: config.database_manager,
            strict_resolution: config.strict_resolution,
            checksum: config.checksum,
            records,
        })
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    /// Runs dump, compression and upload for one configuration.
    ///
    /// Never fails: every error ends up in the returned result.
    pub async fn backup(&self, configuration: BackupConfiguration) -> BackupResult {
        let started = Instant::now();
        let mut configuration = configuration;
        if configuration.backup_type.trim().is_empty() {
            let error = BackupError::invalid_configuration("backup type is empty");
            log!(error);
            return BackupResult::failure(error.to_string());
        }
        if configuration.name.trim().is_empty() {
            configuration.name = default_name(Utc::now());
        }
        if configuration.storage.trim().is_empty() {
            configuration.storage = self.default_storage.clone();
        }
        if configuration.output_path.is_none() {
            configuration.output_path = Some(self.backup_dir.clone());
        }
        log!(BackupLog::BackupStarted {
            name: configuration.name.clone(),
            backup_type: configuration.backup_type.clone(),
        });

        let mut result = BackupResult::pending();
        let mut cleanup = ArtifactCleanup::new();
        let outcome = self
            .run_backup(&configuration, &mut result, &mut cleanup, started)
            .await;
        cleanup.remove_all().await;

        match outcome {
            Ok(record) => {
                log!(BackupLog::BackupCompleted {
                    id: record.id,
                    key: record.file_path.clone(),
                    size: record.file_size.unwrap_or_default(),
                });
                self.records.insert(record.id, record);
                self.notify(BackupEvent::new(BackupEventKind::PostBackup, &configuration).with_result(&result));
            }
            Err(err) => {
                result.set_failed(err.to_string());
                result.set_duration(started.elapsed().as_secs_f64());
                log!(
                    BackupLog::BackupFailed {
                        name: configuration.name.clone(),
                        reason: err.to_string(),
                    },
                    err
                );
                self.notify(BackupEvent::new(BackupEventKind::BackupFailed, &configuration).with_result(&result));
            }
        }
        result
    }

    async fn run_backup(
        &self,
        configuration: &BackupConfiguration,
        result: &mut BackupResult,
        cleanup: &mut ArtifactCleanup,
        started: Instant,
    ) -> Result<BackupRecord, Error> {
        let effective_type = self.resolve_type(&configuration.backup_type)?;
        let adapter = self.select_adapter(&effective_type)?;
        let problems = adapter.validate(configuration);
        if !problems.is_empty() {
            Err(BackupError::invalid_configuration(problems.join("; ")))?
        }
        let storage = self.storage(&configuration.storage)?;
        let compression = match configuration.compression.as_deref() {
            Some(name) => Some(self.compression(name)?),
            None => None,
        };

        self.notify(BackupEvent::new(BackupEventKind::PreBackup, configuration));

        let output_dir = configuration
            .output_path
            .clone()
            .unwrap_or_else(|| self.backup_dir.clone());
        fs::create_dir_all(&output_dir)
            .await
            .map_err(|err| IOError::create_directory_failed(&output_dir, err))?;
        let stem = output_dir.join(artifact_stem(&configuration.name, result.created_at(), result.id()));

        let raw = adapter.backup(configuration, &stem).await?;
        let Some(raw_path) = raw.file_path().map(PathBuf::from) else {
            return Err(AdapterError::archive_failed("adapter reported no artifact").into());
        };
        cleanup.track(&raw_path);
        result.extend_metadata(raw.metadata().clone());

        let mut artifact = raw_path.clone();
        let mut retained = None;
        if let Some(compression) = compression {
            artifact = compression
                .compress(&raw_path, None, CompressionOptions::default())
                .await?;
            cleanup.track(&artifact);
            result.insert_metadata("compression", compression.name());
            if fs::try_exists(&raw_path).await.unwrap_or(false) {
                retained = Some(raw_path);
            }
        }

        if let Some(hash_type) = self.checksum {
            let digest = checksum(artifact.clone(), hash_type).await?;
            result.insert_metadata("checksum", digest);
            result.insert_metadata("checksum_algorithm", json!(hash_type));
        }

        let size = fs::metadata(&artifact)
            .await
            .map_err(|err| IOError::get_metadata_failed(&artifact, err))?
            .len();
        let key = match artifact.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => return Err(StorageError::invalid_key(artifact.display().to_string()).into()),
        };
        let location = storage.store(&artifact, &key).await?;
        if Path::new(&location) == artifact {
            cleanup.release(&artifact);
        }

        result.set_succeeded(&key, Some(size));
        result.set_duration(started.elapsed().as_secs_f64());
        let Some(record) = BackupRecord::from_result(configuration, adapter.name(), result) else {
            return Err(BackupError::invalid_configuration("backup produced no record").into());
        };
        if let Some(database_manager) = &self.database_manager {
            if let Err(err) = database_manager.create_backup_record(&record).await {
                if let Err(delete_err) = storage.delete(&key).await {
                    log!(delete_err);
                }
                Err(err)?
            }
        }
        if let Some(retained) = retained {
            cleanup.release(&retained);
        }
        Ok(record)
    }

    /// Maps the generic database token to a concrete engine via the first
    /// adapter exposing a live connection.
    fn resolve_type(&self, backup_type: &str) -> Result<String, Error> {
        let token = normalize(backup_type);
        if !is_generic_database(&token) {
            return Ok(token);
        }
        let resolved = self
            .adapters
            .iter()
            .find_map(|adapter| adapter.connection())
            .map(driver_resolver::resolve)
            .unwrap_or(DATABASE);
        if resolved != DATABASE {
            log!(BackupLog::TypeResolved {
                from: token,
                to: resolved.to_string(),
            });
            return Ok(resolved.to_string());
        }
        if self.strict_resolution {
            Err(BackupError::UnresolvedDatabaseType)?
        }
        log!(BackupLog::ResolutionFallback);
        Ok(token)
    }

    fn select_adapter(&self, backup_type: &str) -> Result<Arc<dyn BackupAdapter>, Error> {
        match self.adapters.iter().find(|adapter| adapter.supports(backup_type)) {
            Some(adapter) => Ok(adapter.clone()),
            None => Err(BackupError::unsupported_type(backup_type).into()),
        }
    }

    fn storage(&self, name: &str) -> Result<Arc<dyn StorageAdapter>, Error> {
        match self.storages.get(name) {
            Some(storage) => Ok(storage.clone()),
            None => Err(BackupError::storage_not_registered(name).into()),
        }
    }

    fn compression(&self, name: &str) -> Result<Arc<dyn CompressionAdapter>, Error> {
        match self.compressions.get(&normalize(name)) {
            Some(compression) => Ok(compression.clone()),
            None => Err(BackupError::compression_not_registered(name).into()),
        }
    }

    /// Extension first, then magic bytes. The recorded codec is tried before the others.
    async fn detect_compression(
        &self,
        artifact: &Path,
        recorded: Option<&str>,
    ) -> Result<Arc<dyn CompressionAdapter>, Error> {
        let mut candidates: Vec<&Arc<dyn CompressionAdapter>> = self.compressions.values().collect();
        candidates.sort_by(|a, b| {
            (Some(a.name()) != recorded)
                .cmp(&(Some(b.name()) != recorded))
                .then_with(|| a.name().cmp(b.name()))
        });
        for candidate in candidates {
            if candidate.supports(artifact).await {
                return Ok(candidate.clone());
            }
        }
        Err(BackupError::compression_not_registered(recorded.unwrap_or_default()).into())
    }

    /// Applies a stored backup. Failures are logged and reported as `false`.
    pub async fn restore(&self, id: Uuid, options: &Options) -> bool {
        let Some(record) = self.get_backup(id) else {
            log!(BackupError::backup_not_found(id.to_string()));
            return false;
        };
        log!(BackupLog::RestoreStarted { id });
        let configuration = record.to_configuration();
        self.notify(BackupEvent::new(BackupEventKind::PreRestore, &configuration).with_backup_id(id));

        let mut cleanup = ArtifactCleanup::new();
        let outcome = self.run_restore(&record, options, &mut cleanup).await;
        cleanup.remove_all().await;

        match outcome {
            Ok(()) => {
                log!(BackupLog::RestoreCompleted { id });
                self.notify(BackupEvent::new(BackupEventKind::PostRestore, &configuration).with_backup_id(id));
                true
            }
            Err(err) => {
                let reason = err.to_string();
                log!(
                    BackupLog::RestoreFailed {
                        id: id.to_string(),
                        reason: reason.clone(),
                    },
                    err
                );
                self.notify(
                    BackupEvent::new(BackupEventKind::RestoreFailed, &configuration)
                        .with_backup_id(id)
                        .with_error(reason),
                );
                false
            }
        }
    }

    async fn run_restore(
        &self,
        record: &BackupRecord,
        options: &Options,
        cleanup: &mut ArtifactCleanup,
    ) -> Result<(), Error> {
        let storage = self.storage(&record.storage)?;
        let adapter = self.select_adapter(&record.backup_type)?;

        let work_dir = self
            .backup_dir
            .join(format!(".restore_{}", Uuid::new_v4().simple()));
        fs::create_dir_all(&work_dir)
            .await
            .map_err(|err| IOError::create_directory_failed(&work_dir, err))?;
        cleanup.track(&work_dir);

        let file_name = Path::new(&record.file_path)
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(record.id.simple().to_string()));
        let mut artifact = work_dir.join(file_name);
        storage.retrieve(&record.file_path, &artifact).await?;

        if let Some(expected) = record.checksum() {
            verify_checksum(record, &artifact, expected).await?;
        }
        if record.compression.is_some() {
            let compression = self
                .detect_compression(&artifact, record.compression.as_deref())
                .await?;
            artifact = compression
                .decompress(&artifact, None, CompressionOptions::default())
                .await?;
        }
        adapter.restore(&artifact, options).await
    }

    /// Newest first.
    pub fn list_backups(&self) -> Vec<BackupRecord> {
        let mut records: Vec<BackupRecord> = self
            .records
            .iter()
            .map(|record| record.value().clone())
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records
    }

    pub fn get_backup(&self, id: Uuid) -> Option<BackupRecord> {
        self.records.get(&id).map(|record| record.value().clone())
    }

    pub fn get_last_backup(&self) -> Option<BackupRecord> {
        self.records
            .iter()
            .max_by_key(|record| record.created_at)
            .map(|record| record.value().clone())
    }

    /// Removes the stored object, then the index entry. `true` only when both succeed.
    pub async fn delete_backup(&self, id: Uuid) -> bool {
        let Some(record) = self.get_backup(id) else {
            log!(BackupError::backup_not_found(id.to_string()));
            return false;
        };
        let storage = match self.storage(&record.storage) {
            Ok(storage) => storage,
            Err(err) => {
                log!(err);
                return false;
            }
        };
        if let Err(err) = storage.delete(&record.file_path).await {
            log!(err);
            return false;
        }
        if let Some(database_manager) = &self.database_manager {
            if let Err(err) = database_manager.remove_backup_record(id).await {
                log!(err);
                return false;
            }
        }
        self.records.remove(&id);
        log!(BackupLog::BackupDeleted { id });
        true
    }

    pub async fn get_storage_usage(&self) -> StorageUsage {
        let mut usage = StorageUsage::default();
        for record in self.list_backups() {
            let size = record.file_size.unwrap_or_default();
            usage.backup_count += 1;
            usage.total_size += size;
            let entry = usage.storages.entry(record.storage).or_default();
            entry.indexed_count += 1;
            entry.indexed_size += size;
        }
        for (name, storage) in &self.storages {
            let reported_size = match storage.list().await {
                Ok(objects) => Some(objects.iter().map(|object| object.size).sum()),
                Err(err) => {
                    log!(err);
                    None
                }
            };
            usage.storages.entry(name.clone()).or_default().reported_size = reported_size;
        }
        usage
    }

    /// Deletes backups older than the policy's age, sparing the newest
    /// `keep_last`. Restricted to backups called `name` when given.
    pub async fn apply_retention(&self, policy: &RetentionPolicy, name: Option<&str>) -> RetentionReport {
        let mut report = RetentionReport::default();
        let Some(max_age_days) = policy.max_age_days else {
            return report;
        };
        let cutoff = Utc::now() - ChronoDuration::days(i64::from(max_age_days));
        let expired: Vec<Uuid> = self
            .list_backups()
            .into_iter()
            .filter(|record| name.is_none_or(|name| record.name == name))
            .skip(policy.keep_last)
            .filter(|record| record.created_at < cutoff)
            .map(|record| record.id)
            .collect();
        for id in expired {
            if self.delete_backup(id).await {
                report.removed.push(id);
            } else {
                report.failed.push(id);
            }
        }
        log!(BackupLog::RetentionApplied {
            removed: report.removed.len(),
            failed: report.failed.len(),
        });
        report
    }

    fn notify(&self, event: BackupEvent) {
        if let Some(event_sink) = &self.event_sink {
            event_sink.notify(event);
        }
    }
}

async fn verify_checksum(record: &BackupRecord, artifact: &Path, expected: &str) -> Result<(), Error> {
    let algorithm = record
        .metadata
        .get("checksum_algorithm")
        .cloned()
        .and_then(|value: Value| serde_json::from_value::<HashType>(value).ok());
    let Some(hash_type) = algorithm else {
        return Err(BackupError::checksum_mismatch(record.id.to_string()).into());
    };
    let actual = checksum(artifact.to_path_buf(), hash_type).await?;
    if !actual.eq_ignore_ascii_case(expected) {
        Err(BackupError::checksum_mismatch(record.id.to_string()))?
    }
    Ok(())
}
