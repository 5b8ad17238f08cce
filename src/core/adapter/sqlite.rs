use crate::core::adapter::{artifact_path, finish, or_discard, supports_engine, validate_output};
use crate::interface::backup_adapter::BackupAdapter;
use crate::interface::process_runner::ProcessRunner;
use crate::model::backup_configuration::{BackupConfiguration, Options, option_str};
use crate::model::backup_result::BackupResult;
use crate::model::backup_type::SQLITE;
use crate::model::connection::ConnectionDescriptor;
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::error::backup::BackupError;
use crate::model::process::{CommandSpec, DEFAULT_COMMAND_TIMEOUT};
use crate::platform::constants::SQLITE3;
use crate::utils::glob;
use async_trait::async_trait;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

const NAMES: [&str; 2] = [SQLITE, "sqlite3"];

const LIST_TABLES: &str = r"SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite\_%' ESCAPE '\' ORDER BY name";

pub struct SqliteAdapter {
    connection: ConnectionDescriptor,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl SqliteAdapter {
    pub fn new(connection: ConnectionDescriptor, runner: Arc<dyn ProcessRunner>) -> Self {
        Self {
            connection,
            runner,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The database file, from `path` or else `database`.
    fn database_file(&self) -> Option<PathBuf> {
        self.connection.path.clone().or_else(|| {
            self.connection
                .database
                .as_deref()
                .filter(|database| !database.is_empty())
                .map(PathBuf::from)
        })
    }

    fn command(&self, database: &Path) -> CommandSpec {
        CommandSpec::new(SQLITE3)
            .timeout(self.timeout)
            .arg("-batch")
            .arg(database.to_string_lossy())
    }

    async fn tables_to_dump(&self, database: &Path, exclusions: &[String]) -> Result<Option<Vec<String>>, Error> {
        if exclusions.is_empty() {
            return Ok(None);
        }
        let listing = self.command(database).arg("-noheader").arg(LIST_TABLES);
        let output = self.runner.run_checked(&listing).await?;
        let tables: Vec<String> = output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|table| !table.is_empty() && !glob::matches_any(exclusions, table))
            .map(str::to_string)
            .collect();
        if tables.is_empty() {
            Err(BackupError::invalid_configuration("every table is excluded"))?
        }
        Ok(Some(tables))
    }
}

/// `.dump` reads its arguments as LIKE patterns escaped by `\`, so a table
/// name has to be escaped to select that table alone.
fn dump_pattern(table: &str) -> String {
    let mut pattern = String::with_capacity(table.len());
    for ch in table.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    if pattern.contains('\'') {
        // double quoted shell arguments resolve backslash escapes once more
        format!("\"{}\"", pattern.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        format!("'{pattern}'")
    }
}

#[async_trait]
impl BackupAdapter for SqliteAdapter {
    fn name(&self) -> &str {
        SQLITE
    }

    fn supports(&self, backup_type: &str) -> bool {
        supports_engine(backup_type, &NAMES)
    }

    fn validate(&self, configuration: &BackupConfiguration) -> Vec<String> {
        let mut problems = Vec::new();
        validate_output(configuration, &mut problems);
        if self.database_file().is_none() {
            problems.push("connection has no database file".to_string());
        }
        problems
    }

    async fn backup(
        &self,
        configuration: &BackupConfiguration,
        stem: &Path,
    ) -> Result<BackupResult, Error> {
        let database = self
            .database_file()
            .ok_or_else(|| AdapterError::missing_connection_parameter("path"))?;
        let tables = self.tables_to_dump(&database, &configuration.exclusions).await?;
        let dump = artifact_path(stem, "sql");

        let dump_command = match &tables {
            Some(tables) => format!(
                ".dump {}",
                tables.iter().map(|table| dump_pattern(table)).collect::<Vec<_>>().join(" ")
            ),
            None => ".dump".to_string(),
        };
        let command = self.command(&database).arg(dump_command).stdout(&dump);

        or_discard(&dump, self.runner.run_checked(&command)).await?;

        let mut result = finish(&dump, SQLITE).await?;
        result.insert_metadata("database", database.to_string_lossy());
        if let Some(tables) = tables {
            result.insert_metadata("table_count", tables.len());
        }
        result.insert_metadata("excluded_tables", json!(configuration.exclusions));
        Ok(result)
    }

    async fn restore(&self, file_path: &Path, options: &Options) -> Result<(), Error> {
        let database = match option_str(options, "database") {
            Some(database) => PathBuf::from(database),
            None => self
                .database_file()
                .ok_or_else(|| AdapterError::missing_connection_parameter("path"))?,
        };
        let command = self.command(&database).stdin(file_path);
        self.runner.run_checked(&command).await?;
        Ok(())
    }

    fn connection(&self) -> Option<&ConnectionDescriptor> {
        Some(&self.connection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::process::CommandOutput;
    use std::sync::Mutex;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recording {
        commands: Mutex<Vec<CommandSpec>>,
    }

    #[async_trait]
    impl ProcessRunner for Recording {
        async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, Error> {
            self.commands.lock().unwrap().push(command.clone());
            if let Some(stdout) = &command.stdout {
                std::fs::write(stdout, "BEGIN TRANSACTION;\nCOMMIT;\n").unwrap();
            }
            Ok(CommandOutput {
                success: true,
                code: Some(0),
                stdout: "logs\nusers\nlog_archive\n".to_string(),
                stderr: String::new(),
            })
        }
    }

    #[tokio::test]
    async fn exclusions_narrow_the_dump_to_remaining_tables() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(Recording::default());
        let connection = ConnectionDescriptor::default()
            .with_platform("sqlite")
            .with_path(dir.path().join("app.db"));
        let adapter = SqliteAdapter::new(connection, runner.clone());
        let configuration = BackupConfiguration::new("sqlite")
            .with_output_path(dir.path())
            .with_exclusions(["log*"]);

        let result = adapter
            .backup(&configuration, &dir.path().join("app_1"))
            .await
            .unwrap();

        assert_eq!(result.metadata()["table_count"], json!(1));
        let commands = runner.commands.lock().unwrap();
        assert_eq!(commands[1].args.last().unwrap(), ".dump 'users'");
        assert_eq!(commands[1].stdout.as_deref(), Some(dir.path().join("app_1.sql").as_path()));
    }

    #[tokio::test]
    async fn excluding_everything_is_a_configuration_error() {
        let dir = TempDir::new().unwrap();
        let connection = ConnectionDescriptor::default().with_database("app.db");
        let adapter = SqliteAdapter::new(connection, Arc::new(Recording::default()));
        let configuration = BackupConfiguration::new("sqlite")
            .with_output_path(dir.path())
            .with_exclusions(["*"]);

        assert!(adapter.backup(&configuration, &dir.path().join("all")).await.is_err());
        assert!(!dir.path().join("all.sql").exists());
    }

    #[tokio::test]
    async fn kept_tables_are_dumped_as_exact_names() {
        let dir = TempDir::new().unwrap();
        let runner = Arc::new(Recording::default());
        let connection = ConnectionDescriptor::default().with_path(dir.path().join("app.db"));
        let adapter = SqliteAdapter::new(connection, runner.clone());
        let configuration = BackupConfiguration::new("sqlite")
            .with_output_path(dir.path())
            .with_exclusions(["logs"]);

        adapter.backup(&configuration, &dir.path().join("app_2")).await.unwrap();

        let commands = runner.commands.lock().unwrap();
        assert_eq!(commands[1].args.last().unwrap(), r".dump 'users' 'log\_archive'");
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(dump_pattern("users"), "'users'");
        assert_eq!(dump_pattern("50%_off"), r"'50\%\_off'");
        assert_eq!(dump_pattern(r"a\b"), r"'a\\b'");
        assert_eq!(dump_pattern("o'neil_x"), r#""o'neil\\_x""#);
    }
}
