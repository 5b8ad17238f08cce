pub const CONFIG_PATH: &str = ".\\config.toml";
pub const LOG_DIR: &str = ".\\logs";

pub const MYSQL_DUMP: &str = "mysqldump.exe";
pub const MYSQL_CLIENT: &str = "mysql.exe";
pub const PG_DUMP: &str = "pg_dump.exe";
pub const PG_RESTORE: &str = "pg_restore.exe";
pub const PSQL: &str = "psql.exe";
pub const SQLITE3: &str = "sqlite3.exe";
pub const SQLCMD: &str = "sqlcmd.exe";
