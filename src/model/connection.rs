use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Parameters of a live database connection.
///
/// Only read by the driver resolver and by the dump/restore command
/// builders, never mutated after construction.
#[derive(Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Platform or dialect name reported by the connection (`mysql`, `postgresql`, ...).
    #[serde(default)]
    pub platform: Option<String>,
    /// Driver identifier (`pdo_pgsql`, `mysqli`, ...).
    #[serde(default)]
    pub driver: Option<String>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    /// Database file, for file based engines.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ConnectionDescriptor {
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = Some(platform.into());
        self
    }

    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    pub fn with_host(mut self, host: impl Into<String>, port: Option<u16>) -> Self {
        self.host = Some(host.into());
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: Option<String>) -> Self {
        self.user = Some(user.into());
        self.password = password;
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Debug for ConnectionDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionDescriptor")
            .field("platform", &self.platform)
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("database", &self.database)
            .field("path", &self.path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_password() {
        let connection = ConnectionDescriptor::default()
            .with_host("db.internal", Some(5432))
            .with_credentials("backup", Some("hunter2".to_string()));

        let debug = format!("{connection:?}");

        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("***"));
        assert!(debug.contains("db.internal"));
    }
}
