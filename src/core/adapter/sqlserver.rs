use crate::core::adapter::{artifact_path, finish, or_discard, required, supports_engine, validate_output};
use crate::interface::backup_adapter::BackupAdapter;
use crate::interface::process_runner::ProcessRunner;
use crate::model::backup_configuration::{BackupConfiguration, Options, option_str};
use crate::model::backup_result::BackupResult;
use crate::model::backup_type::SQLSERVER;
use crate::model::connection::ConnectionDescriptor;
use crate::model::error::Error;
use crate::model::process::{CommandSpec, DEFAULT_COMMAND_TIMEOUT};
use crate::platform::constants::SQLCMD;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

const NAMES: [&str; 3] = [SQLSERVER, "mssql", "sqlsrv"];

/// Native `BACKUP DATABASE` through `sqlcmd`. The `.bak` file is written by
/// the server process, so the output path must be reachable from the server.
pub struct SqlServerAdapter {
    connection: ConnectionDescriptor,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
}

impl SqlServerAdapter {
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

    fn command(&self, query: String) -> CommandSpec {
        let connection = &self.connection;
        let server = match (&connection.host, connection.port) {
            (Some(host), Some(port)) => Some(format!("{host},{port}")),
            (Some(host), None) => Some(host.clone()),
            (None, _) => None,
        };
        let mut command = CommandSpec::new(SQLCMD)
            .timeout(self.timeout)
            .opt_arg("-S", server)
            .opt_arg("-U", connection.user.as_deref());
        if let Some(password) = &connection.password {
            command = command.env("SQLCMDPASSWORD", password);
        }
        command.arg("-b").arg("-Q").arg(query)
    }
}

fn identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

fn literal(path: &Path) -> String {
    format!("N'{}'", path.to_string_lossy().replace('\'', "''"))
}

#[async_trait]
impl BackupAdapter for SqlServerAdapter {
    fn name(&self) -> &str {
        SQLSERVER
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
        if !configuration.exclusions.is_empty() {
            problems.push("native sqlserver backups cannot exclude tables".to_string());
        }
        problems
    }

    async fn backup(
        &self,
        configuration: &BackupConfiguration,
        stem: &Path,
    ) -> Result<BackupResult, Error> {
        let database = required(self.connection.database.as_deref(), "database")?;
        let backup = artifact_path(stem, "bak");
        let query = format!(
            "BACKUP DATABASE {} TO DISK = {} WITH INIT",
            identifier(database),
            literal(&backup)
        );

        or_discard(&backup, self.runner.run_checked(&self.command(query))).await?;

        let mut result = finish(&backup, SQLSERVER).await?;
        result.insert_metadata("database", database);
        if !configuration.name.is_empty() {
            result.insert_metadata("backup_set", configuration.name.as_str());
        }
        Ok(result)
    }

    async fn restore(&self, file_path: &Path, options: &Options) -> Result<(), Error> {
        let database = match option_str(options, "database") {
            Some(database) => database,
            None => required(self.connection.database.as_deref(), "database")?,
        };
        let query = format!(
            "RESTORE DATABASE {} FROM DISK = {} WITH REPLACE",
            identifier(database),
            literal(file_path)
        );
        self.runner.run_checked(&self.command(query)).await?;
        Ok(())
    }

    fn connection(&self) -> Option<&ConnectionDescriptor> {
        Some(&self.connection)
    }
}
