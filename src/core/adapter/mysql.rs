use crate::core::adapter::{artifact_path, finish, or_discard, required, supports_engine, validate_output};
use crate::interface::backup_adapter::BackupAdapter;
use crate::interface::process_runner::ProcessRunner;
use crate::model::backup_configuration::{BackupConfiguration, Options, option_bool, option_str};
use crate::model::backup_result::BackupResult;
use crate::model::backup_type::MYSQL;
use crate::model::connection::ConnectionDescriptor;
use crate::model::error::Error;
use crate::model::process::{CommandSpec, DEFAULT_COMMAND_TIMEOUT};
use crate::platform::constants::{MYSQL_CLIENT, MYSQL_DUMP};
use crate::utils::glob;
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const NAMES: [&str; 2] = [MYSQL, "mariadb"];

pub struct MySqlAdapter {
    connection: ConnectionDescriptor,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl MySqlAdapter {
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

    fn command(&self, program: &str) -> CommandSpec {
        let connection = &self.connection;
        let mut command = CommandSpec::new(program).timeout(self.timeout);
        if let Some(host) = &connection.host {
            command = command.arg(format!("--host={host}"));
        }
        if let Some(port) = connection.port {
            command = command.arg(format!("--port={port}"));
        }
        if let Some(user) = &connection.user {
            command = command.arg(format!("--user={user}"));
        }
        if let Some(password) = &connection.password {
            command = command.env("MYSQL_PWD", password);
        }
        command
    }

    /// Literal exclusions are used as given, wildcard ones are matched
    /// against the live table list.
    async fn excluded_tables(&self, database: &str, exclusions: &[String]) -> Result<Vec<String>, Error> {
        if !exclusions.iter().any(|pattern| glob::has_wildcard(pattern)) {
            return Ok(exclusions.to_vec());
        }
        let listing = self
            .command(MYSQL_CLIENT)
            .args(["--batch", "--skip-column-names", "--execute=SHOW TABLES"])
            .arg(database);
        let output = self.runner.run_checked(&listing).await?;
        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|table| !table.is_empty() && glob::matches_any(exclusions, table))
            .map(str::to_string)
            .collect())
    }
}

#[async_trait]
impl BackupAdapter for MySqlAdapter {
    fn name(&self) -> &str {
        MYSQL
    }

    fn supports(&self, backup_type: &str) -> bool {
        supports_engine(backup_type, &NAMES)
    }

    fn validate(&self, configuration: &BackupConfiguration) -> Vec<String> {
        let mut problems = Vec::new();
        validate_output(configuration, &mut problems);
        if self.connection.database.as_deref().is_none_or(str::is_empty) {
            problems.push("connection has no database name".to_string());
        }
        problems
    }

    async fn backup(
        &self,
        configuration: &BackupConfiguration,
        stem: &Path,
    ) -> Result<BackupResult, Error> {
        let database = required(self.connection.database.as_deref(), "database")?;
        let excluded = self.excluded_tables(database, &configuration.exclusions).await?;
        let dump = artifact_path(stem, "sql");

        let mut command = self.command(MYSQL_DUMP);
        if option_bool(&configuration.options, "single_transaction").unwrap_or(true) {
            command = command.arg("--single-transaction");
        }
        if option_bool(&configuration.options, "routines").unwrap_or(true) {
            command = command.args(["--routines", "--triggers"]);
        }
        let command = command
            .args(excluded.iter().map(|table| format!("--ignore-table={database}.{table}")))
            .arg(format!("--result-file={}", dump.display()))
            .arg(database);

        or_discard(&dump, self.runner.run_checked(&command)).await?;

        let mut result = finish(&dump, MYSQL).await?;
        result.insert_metadata("database", database);
        result.insert_metadata("excluded_tables", json!(excluded));
        Ok(result)
    }

    async fn restore(&self, file_path: &Path, options: &Options) -> Result<(), Error> {
        let database = match option_str(options, "database") {
            Some(database) => database,
            None => required(self.connection.database.as_deref(), "database")?,
        };
        let command = self.command(MYSQL_CLIENT).arg(database).stdin(file_path);
        self.runner.run_checked(&command).await?;
        Ok(())
    }

    fn connection(&self) -> Option<&ConnectionDescriptor> {
        Some(&self.connection)
    }
}
