use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::model::backup_schedule::ScheduleState;
use crate::model::error::Error;
use crate::model::error::database::DatabaseError;
use sqlx::Row;

pub trait ScheduleRepository {
    async fn create_schedule_state_table(&self) -> Result<(), Error>;
    async fn save_schedule_state(&self, state: &ScheduleState) -> Result<(), Error>;
    async fn get_schedule_state(&self, name: &str) -> Result<Option<ScheduleState>, Error>;
}

impl ScheduleRepository for DatabaseManager {
    async fn create_schedule_state_table(&self) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            CREATE TABLE ScheduleStates (
                name TEXT PRIMARY KEY,
                next_run TEXT NOT NULL,
                last_run TEXT
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }

    async fn save_schedule_state(&self, state: &ScheduleState) -> Result<(), Error> {
        let pool = self.get_pool();
        sqlx::query(
            r#"
            INSERT INTO ScheduleStates (name, next_run, last_run)
            VALUES (?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                next_run = excluded.next_run,
                last_run = excluded.last_run
            "#,
        )
        .bind(&state.name)
        .bind(state.next_run)
        .bind(state.last_run)
        .execute(&pool)
        .await
        .map_err(DatabaseError::statement_execution_failed)?;
        Ok(())
    }

    async fn get_schedule_state(&self, name: &str) -> Result<Option<ScheduleState>, Error> {
        let pool = self.get_pool();
        let row = sqlx::query("SELECT name, next_run, last_run FROM ScheduleStates WHERE name = ?")
            .bind(name)
            .fetch_optional(&pool)
            .await
            .map_err(DatabaseError::statement_execution_failed)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(ScheduleState {
            name: row
                .try_get("name")
                .map_err(DatabaseError::statement_execution_failed)?,
            next_run: row
                .try_get("next_run")
                .map_err(DatabaseError::statement_execution_failed)?,
            last_run: row
                .try_get("last_run")
                .map_err(DatabaseError::statement_execution_failed)?,
        }))
    }
}
