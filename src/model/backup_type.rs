//! Type tokens accepted in [`BackupConfiguration::backup_type`](crate::model::backup_configuration::BackupConfiguration).
//!
//! `database` and `filesystem` are generic tokens, the rest name a concrete
//! database engine.

pub const DATABASE: &str = "database";
pub const FILESYSTEM: &str = "filesystem";

pub const MYSQL: &str = "mysql";
pub const POSTGRESQL: &str = "postgresql";
pub const SQLITE: &str = "sqlite";
pub const SQLSERVER: &str = "sqlserver";

pub const ENGINES: [&str; 4] = [MYSQL, POSTGRESQL, SQLITE, SQLSERVER];

pub fn is_generic_database(token: &str) -> bool {
    token.eq_ignore_ascii_case(DATABASE)
}

pub fn normalize(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}
