use crate::core::adapter::{artifact_path, finish, or_discard, required, supports_engine, validate_output};
use crate::interface::backup_adapter::BackupAdapter;
use crate::interface::compression_adapter::starts_with_magic;
use crate::interface::process_runner::ProcessRunner;
use crate::model::backup_configuration::{BackupConfiguration, Options, option_str};
use crate::model::backup_result::BackupResult;
use crate::model::backup_type::POSTGRESQL;
use crate::model::connection::ConnectionDescriptor;
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::process::{CommandSpec, DEFAULT_COMMAND_TIMEOUT};
use crate::platform::constants::{PG_DUMP, PG_RESTORE, PSQL};
use async_trait::async_trait;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const NAMES: [&str; 3] = [POSTGRESQL, "postgres", "pgsql"];

/// Header of pg_dump's custom archive format.
const CUSTOM_FORMAT_MAGIC: &[u8] = b"PGDMP";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DumpFormat {
    Custom,
    Plain,
}

impl DumpFormat {
    fn parse(value: Option<&str>) -> Result<Self, Error> {
        match value.map(str::to_ascii_lowercase).as_deref() {
            None | Some("custom") | Some("c") => Ok(DumpFormat::Custom),
            Some("plain") | Some("p") | Some("sql") => Ok(DumpFormat::Plain),
            Some(other) => Err(AdapterError::invalid_options(format!(
                "unknown pg_dump format {other}"
            ))
            .into()),
        }
    }

    fn flag(self) -> &'static str {
        match self {
            DumpFormat::Custom => "custom",
            DumpFormat::Plain => "plain",
        }
    }

    fn extension(self) -> &'static str {
        match self {
            DumpFormat::Custom => "dump",
            DumpFormat::Plain => "sql",
        }
    }
}

pub struct PostgreSqlAdapter {
    connection: ConnectionDescriptor,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl PostgreSqlAdapter {
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
        let mut command = CommandSpec::new(program)
            .timeout(self.timeout)
            .opt_arg("--host", connection.host.as_deref())
            .opt_arg("--port", connection.port)
            .opt_arg("--username", connection.user.as_deref())
            .arg("--no-password");
        if let Some(password) = &connection.password {
            command = command.env("PGPASSWORD", password);
        }
        command
    }
}

#[async_trait]
impl BackupAdapter for PostgreSqlAdapter {
    fn name(&self) -> &str {
        POSTGRESQL
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
        if let Err(err) = DumpFormat::parse(configuration.option_str("format")) {
            problems.push(err.to_string());
        }
        problems
    }

    async fn backup(
        &self,
        configuration: &BackupConfiguration,
        stem: &Path,
    ) -> Result<BackupResult, Error> {
        let database = required(self.connection.database.as_deref(), "database")?;
        let format = DumpFormat::parse(configuration.option_str("format"))?;
        let dump = artifact_path(stem, format.extension());

        // pg_dump understands `*` and `?` in table patterns itself.
        let command = self
            .command(PG_DUMP)
            .args(["--format", format.flag()])
            .arg("--file")
            .arg(dump.to_string_lossy())
            .args(
                configuration
                    .exclusions
                    .iter()
                    .flat_map(|pattern| ["--exclude-table".to_string(), pattern.clone()]),
            )
            .arg(database);

        or_discard(&dump, self.runner.run_checked(&command)).await?;

        let mut result = finish(&dump, POSTGRESQL).await?;
        result.insert_metadata("database", database);
        result.insert_metadata("format", format.flag());
        result.insert_metadata("excluded_tables", json!(configuration.exclusions));
        Ok(result)
    }

    /// Custom format archives go through pg_restore, plain SQL through psql.
    async fn restore(&self, file_path: &Path, options: &Options) -> Result<(), Error> {
        let database = match option_str(options, "database") {
            Some(database) => database,
            None => required(self.connection.database.as_deref(), "database")?,
        };
        let command = if starts_with_magic(file_path, CUSTOM_FORMAT_MAGIC).await {
            self.command(PG_RESTORE)
                .args(["--clean", "--if-exists", "--no-owner"])
                .args(["--dbname", database])
                .arg(file_path.to_string_lossy())
        } else {
            self.command(PSQL)
                .args(["--set", "ON_ERROR_STOP=1", "--quiet"])
                .args(["--dbname", database])
                .arg("--file")
                .arg(file_path.to_string_lossy())
        };
        self.runner.run_checked(&command).await?;
        Ok(())
    }

    fn connection(&self) -> Option<&ConnectionDescriptor> {
        Some(&self.connection)
    }
}
