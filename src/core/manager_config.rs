use crate::core::adapter::filesystem::FilesystemAdapter;
use crate::core::adapter::mysql::MySqlAdapter;
use crate::core::adapter::postgresql::PostgreSqlAdapter;
use crate::core::adapter::sqlite::SqliteAdapter;
use crate::core::adapter::sqlserver::SqlServerAdapter;
use crate::core::compression::gzip::GzipCompression;
use crate::core::compression::zip::ZipCompression;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::core::storage::build_storage;
use crate::core::storage::local::LocalStorage;
use crate::interface::backup_adapter::BackupAdapter;
use crate::interface::compression_adapter::CompressionAdapter;
use crate::interface::event_sink::EventSink;
use crate::interface::process_runner::ProcessRunner;
use crate::interface::storage_adapter::StorageAdapter;
use crate::model::backup_configuration::DEFAULT_STORAGE;
use crate::model::backup_type::{MYSQL, POSTGRESQL, SQLITE, SQLSERVER, normalize};
use crate::model::config::{Config, DatabaseConfig};
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::model::hash_type::HashType;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Everything a [`BackupManager`](crate::core::backup_manager::BackupManager)
/// is built from. Adapters are registered here once and are read-only for
/// the lifetime of the manager.
pub struct ManagerConfig {
    pub(crate) backup_dir: PathBuf,
    pub(crate) adapters: Vec<Arc<dyn BackupAdapter>>,
    pub(crate) storages: HashMap<String, Arc<dyn StorageAdapter>>,
    pub(crate) compressions: HashMap<String, Arc<dyn CompressionAdapter>>,
    pub(crate) default_storage: String,
    pub(crate) event_sink: Option<Arc<dyn EventSink>>,
    pub(crate) database_manager: Option<Arc<DatabaseManager>>,
    pub(crate) strict_resolution: bool,
    pub(crate) checksum: Option<HashType>,
}

impl ManagerConfig {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
            adapters: Vec::new(),
            storages: HashMap::new(),
            compressions: HashMap::new(),
            default_storage: DEFAULT_STORAGE.to_string(),
            event_sink: None,
            database_manager: None,
            strict_resolution: false,
            checksum: None,
        }
    }

    /// Database adapters are matched in registration order.
    pub fn with_adapter(mut self, adapter: Arc<dyn BackupAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn StorageAdapter>) -> Self {
        self.storages.insert(storage.name().to_string(), storage);
        self
    }

    pub fn with_compression(mut self, compression: Arc<dyn CompressionAdapter>) -> Self {
        self.compressions
            .insert(compression.name().to_string(), compression);
        self
    }

    /// Registers gzip and zip with their default levels.
    pub fn with_default_compressions(self) -> Self {
        self.with_compression(Arc::new(GzipCompression::default()))
            .with_compression(Arc::new(ZipCompression::default()))
    }

    pub fn with_default_storage(mut self, name: impl Into<String>) -> Self {
        self.default_storage = name.into();
        self
    }

    pub fn with_event_sink(mut self, event_sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = Some(event_sink);
        self
    }

    pub fn with_database_manager(mut self, database_manager: Arc<DatabaseManager>) -> Self {
        self.database_manager = Some(database_manager);
        self
    }

    pub fn with_strict_resolution(mut self, strict: bool) -> Self {
        self.strict_resolution = strict;
        self
    }

    pub fn with_checksum(mut self, hash_type: Option<HashType>) -> Self {
        self.checksum = hash_type;
        self
    }

    /// Builds every adapter named in the configuration file. A `local`
    /// storage under `<backup_dir>/storage` is added when none is configured.
    pub fn from_config(config: &Config, runner: Arc<dyn ProcessRunner>) -> Result<Self, Error> {
        let command_timeout = Duration::from_secs(config.command_timeout);
        let compression = config.compression;

        let mut manager_config = Self::new(&config.backup_dir)
            .with_default_storage(&config.default_storage)
            .with_strict_resolution(config.strict_resolution)
            .with_checksum(config.checksum)
            .with_adapter(Arc::new(FilesystemAdapter))
            .with_compression(Arc::new(GzipCompression::new(
                compression.gzip_level,
                compression.keep_original,
            )))
            .with_compression(Arc::new(ZipCompression::new(
                compression.zip_level,
                compression.keep_original,
            )));

        for database in &config.databases {
            let adapter = database_adapter(database, runner.clone(), command_timeout)?;
            manager_config = manager_config.with_adapter(adapter);
        }
        for storage in &config.storages {
            manager_config = manager_config.with_storage(build_storage(storage)?);
        }
        if !manager_config.storages.contains_key(DEFAULT_STORAGE) {
            let root = config.backup_dir.join("storage");
            manager_config = manager_config.with_storage(Arc::new(LocalStorage::new(DEFAULT_STORAGE, root)));
        }
        Ok(manager_config)
    }
}

fn database_adapter(
    database: &DatabaseConfig,
    runner: Arc<dyn ProcessRunner>,
    timeout: Duration,
) -> Result<Arc<dyn BackupAdapter>, Error> {
    let connection = database.connection.clone();
    let adapter: Arc<dyn BackupAdapter> = match normalize(&database.engine).as_str() {
        MYSQL | "mariadb" => Arc::new(MySqlAdapter::new(connection, runner).with_timeout(timeout)),
        POSTGRESQL | "postgres" | "pgsql" => {
            Arc::new(PostgreSqlAdapter::new(connection, runner).with_timeout(timeout))
        }
        SQLITE | "sqlite3" => Arc::new(SqliteAdapter::new(connection, runner).with_timeout(timeout)),
        SQLSERVER | "mssql" | "sqlsrv" => {
            Arc::new(SqlServerAdapter::new(connection, runner).with_timeout(timeout))
        }
        engine => {
            return Err(SystemError::invalid_config(format!("unknown database engine {engine}")).into());
        }
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::infrastructure::process_runner::TokioProcessRunner;
    use crate::model::config::ConfigTable;

    fn config(databases: &str) -> Config {
        let content = format!(
            r#"
            [Config]
            backup_dir = "/var/backups/sphere"
            index_path = "/var/backups/sphere/index.db"
            {databases}
            "#
        );
        toml::from_str::<ConfigTable>(&content).unwrap().config
    }

    #[test]
    fn registers_configured_engines_in_order() {
        let config = config(
            r#"
            [[Config.databases]]
            engine = "pgsql"
            platform = "postgresql"
            database = "orders"

            [[Config.databases]]
            engine = "MariaDB"
            database = "shop"
            "#,
        );

        let manager_config = ManagerConfig::from_config(&config, Arc::new(TokioProcessRunner)).unwrap();

        let names: Vec<&str> = manager_config.adapters.iter().map(|adapter| adapter.name()).collect();
        assert_eq!(names, ["filesystem", "postgresql", "mysql"]);
        assert!(manager_config.storages.contains_key("local"));
        assert!(manager_config.compressions.contains_key("gzip"));
        assert!(manager_config.compressions.contains_key("zip"));
    }

    #[test]
    fn unknown_engine_is_rejected() {
        let config = config(
            r#"
            [[Config.databases]]
            engine = "oracle"
            "#,
        );

        assert!(ManagerConfig::from_config(&config, Arc::new(TokioProcessRunner)).is_err());
    }
}
