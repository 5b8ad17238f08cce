use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::model::backup_result::BackupRecord;
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use crate::model::error::misc::MiscError;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use uuid::Uuid;

pub trait BackupRepository {
    async fn create_backup_record_table(&self) -> Result<(), Error>;
    async fn create_backup_record(&self, record: &BackupRecord) -> Result<(), Error>;
    async fn remove_backup_record(&self, id: Uuid) -> Result<bool, Error>;
    async fn get_backup_record(&self, id: Uuid) -> Result<Option<BackupRecord>, Error>;
    async fn get_all_backup_records(&self) -> Result<Vec<BackupRecord>, Error>;
}

impl BackupRepository for DatabaseManager {
    async fn create_backup_record_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE Backups (
                id BLOB PRIMARY KEY,
                name TEXT NOT NULL,
                backup_type TEXT NOT NULL,
                storage TEXT NOT NULL,
                compression TEXT,
                file_path TEXT NOT NULL,
                file_size INTEGER,
                created_at TEXT NOT NULL,
                duration REAL,
                metadata TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }

    async fn create_backup_record(&self, record: &BackupRecord) -> Result<(), Error> {
        let pool = self.get_pool();
        let metadata = serde_json::to_string(&record.metadata).map_err(MiscError::serialize_error)?;
        sqlx::query(
            r#"
            INSERT INTO Backups (
                id,
                name,
                backup_type,
                storage,
                compression,
                file_path,
                file_size,
                created_at,
                duration,
                metadata
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(record.id.as_bytes().as_slice())
        .bind(&record.name)
        .bind(&record.backup_type)
        .bind(&record.storage)
        .bind(&record.compression)
        .bind(&record.file_path)
        .bind(record.file_size.map(|size| size as i64))
        .bind(record.created_at)
        .bind(record.duration)
        .bind(metadata)
        .execute(&pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }

    async fn remove_backup_record(&self, id: Uuid) -> Result<bool, Error> {
        let pool = self.get_pool();
        let result = sqlx::query("DELETE FROM Backups WHERE id = ?")
            .bind(id.as_bytes().as_slice())
            .execute(&pool)
            .await
            .map_err(DatabaseError::statement_execution_failed)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_backup_record(&self, id: Uuid) -> Result<Option<BackupRecord>, Error> {
        let pool = self.get_pool();
        let row = sqlx::query(
            r#"
            SELECT
                id,
                name,
                backup_type,
                storage,
                compression,
                file_path,
                file_size,
                created_at,
                duration,
                metadata
            FROM Backups
            WHERE id = ?
            "#,
        )
        .bind(id.as_bytes().as_slice())
        .fetch_optional(&pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn get_all_backup_records(&self) -> Result<Vec<BackupRecord>, Error> {
        let pool = self.get_pool();
        let rows = sqlx::query(
            r#"
            SELECT
                id,
                name,
                backup_type,
                storage,
                compression,
                file_path,
                file_size,
                created_at,
                duration,
                metadata
            FROM Backups
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;

        rows.iter().map(record_from_row).collect()
    }
}

fn record_from_row(row: &SqliteRow) -> Result<BackupRecord, Error> {
    let id_bytes: Vec<u8> = row
        .try_get("id")
        .map_err(DatabaseError::statement_execution_failed)?;
    let id = Uuid::from_slice(&id_bytes).map_err(|_| DatabaseError::DataCorrupted)?;

    let metadata_str: String = row
        .try_get("metadata")
        .map_err(DatabaseError::statement_execution_failed)?;
    let metadata = serde_json::from_str(&metadata_str).map_err(MiscError::deserialize_error)?;

    let file_size: Option<i64> = row
        .try_get("file_size")
        .map_err(DatabaseError::statement_execution_failed)?;

    Ok(BackupRecord {
        id,
        name: column(row, "name")?,
        backup_type: column(row, "backup_type")?,
        storage: column(row, "storage")?,
        compression: column(row, "compression")?,
        file_path: column(row, "file_path")?,
        file_size: file_size.map(|size| size.max(0) as u64),
        created_at: column(row, "created_at")?,
        duration: column(row, "duration")?,
        metadata,
    })
}

fn column<'r, T>(row: &'r SqliteRow, name: &str) -> Result<T, Error>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    Ok(row
        .try_get(name)
        .map_err(DatabaseError::statement_execution_failed)?)
}
