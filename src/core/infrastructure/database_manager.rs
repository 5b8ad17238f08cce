use crate::interface::repository::backup_record::BackupRepository;
use crate::interface::repository::schedule::ScheduleRepository;
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use crate::model::error::io::IOError;
use crate::model::log::database::DatabaseLog;
use crate::utils::database_lock::DatabaseLock;
use macros::log;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::fs::File;

/// Owns the sqlite index of stored backups and schedule run state.
#[derive(Debug)]
pub struct DatabaseManager {
    pool: SqlitePool,
    path: PathBuf,
    _lock: DatabaseLock,
}

impl DatabaseManager {
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| IOError::create_directory_failed(parent, err))?;
        }
        let lock = DatabaseLock::acquire(&path)?;
        if !Self::exist_database(&path).await {
            Self::create_database(&path).await?;
        }
        let options = SqliteConnectOptions::new().filename(&path);
        let pool = SqlitePool::connect_with(options)
            .await
            .map_err(DatabaseError::database_connect_failed)?;
        log!(DatabaseLog::DatabaseConnectSuccess);
        let database_manager = Self {
            pool,
            path,
            _lock: lock,
        };
        if !database_manager.exist_table("Backups").await {
            database_manager.create_backup_record_table().await?;
        }
        if !database_manager.exist_table("ScheduleStates").await {
            database_manager.create_schedule_state_table().await?;
        }
        Ok(database_manager)
    }

    pub fn get_pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exist_database(path: &Path) -> bool {
        fs::metadata(path).await.is_ok()
    }

    pub async fn create_database(path: &Path) -> Result<(), Error> {
        let _ = File::create(path)
            .await
            .map_err(DatabaseError::create_database_failed)?;
        Ok(())
    }

    pub async fn exist_table(&self, table_name: &str) -> bool {
        let pool = self.get_pool();
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type='table' AND name = ?)",
        )
        .bind(table_name)
        .fetch_one(&pool)
        .await
        .unwrap_or(false)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::backup_result::BackupRecord;
    use crate::model::backup_schedule::ScheduleState;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn record(name: &str, hour: u32) -> BackupRecord {
        let mut metadata = serde_json::Map::new();
        metadata.insert("engine".to_string(), json!("postgresql"));
        BackupRecord {
            id: Uuid::new_v4(),
            name: name.to_string(),
            backup_type: "postgresql".to_string(),
            storage: "local".to_string(),
            compression: Some("gzip".to_string()),
            file_path: format!("{name}.sql.gz"),
            file_size: Some(1024),
            created_at: Utc.with_ymd_and_hms(2026, 1, 1, hour, 0, 0).unwrap(),
            duration: Some(1.5),
            metadata,
        }
    }

    #[tokio::test]
    async fn records_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index").join("index.db");
        let older = record("older", 1);
        let newer = record("newer", 2);

        {
            let manager = DatabaseManager::new(&path).await.unwrap();
            manager.create_backup_record(&older).await.unwrap();
            manager.create_backup_record(&newer).await.unwrap();
            manager.close().await;
        }

        let manager = DatabaseManager::new(&path).await.unwrap();
        let records = manager.get_all_backup_records().await.unwrap();
        assert_eq!(records, vec![newer.clone(), older.clone()]);

        assert!(manager.remove_backup_record(older.id).await.unwrap());
        assert!(!manager.remove_backup_record(older.id).await.unwrap());
        assert!(manager.get_backup_record(older.id).await.unwrap().is_none());
        assert_eq!(manager.get_backup_record(newer.id).await.unwrap(), Some(newer));
    }

    #[tokio::test]
    async fn second_manager_on_same_index_is_refused() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("index.db");

        let _first = DatabaseManager::new(&path).await.unwrap();

        assert!(DatabaseManager::new(&path).await.is_err());
    }

    #[tokio::test]
    async fn schedule_state_upserts() {
        let dir = TempDir::new().unwrap();
        let manager = DatabaseManager::new(dir.path().join("index.db")).await.unwrap();
        let mut state = ScheduleState {
            name: "nightly".to_string(),
            next_run: Utc.with_ymd_and_hms(2026, 1, 2, 2, 0, 0).unwrap(),
            last_run: None,
        };

        manager.save_schedule_state(&state).await.unwrap();
        state.last_run = Some(state.next_run);
        state.next_run = Utc.with_ymd_and_hms(2026, 1, 3, 2, 0, 0).unwrap();
        manager.save_schedule_state(&state).await.unwrap();

        assert_eq!(manager.get_schedule_state("nightly").await.unwrap(), Some(state));
        assert!(manager.get_schedule_state("weekly").await.unwrap().is_none());
    }
}
