pub const CONFIG_PATH: &str = "./config.toml";
pub const LOG_DIR: &str = "./logs";

pub const MYSQL_DUMP: &str = "mysqldump";
pub const MYSQL_CLIENT: &str = "mysql";
pub const PG_DUMP: &str = "pg_dump";
pub const PG_RESTORE: &str = "pg_restore";
pub const PSQL: &str = "psql";
pub const SQLITE3: &str = "sqlite3";
pub const SQLCMD: &str = "sqlcmd";
