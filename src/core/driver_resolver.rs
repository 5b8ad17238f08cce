use crate::model::backup_type::{DATABASE, MYSQL, POSTGRESQL, SQLITE, SQLSERVER};
use crate::model::connection::ConnectionDescriptor;

const PLATFORMS: [(&str, &str); 11] = [
    ("mysql", MYSQL),
    ("mariadb", MYSQL),
    ("postgresql", POSTGRESQL),
    ("postgres", POSTGRESQL),
    ("pgsql", POSTGRESQL),
    ("sqlite", SQLITE),
    ("sqlite3", SQLITE),
    ("mssql", SQLSERVER),
    ("sqlserver", SQLSERVER),
    ("sqlsrv", SQLSERVER),
    ("sql_server", SQLSERVER),
];

/// Checked in order, so `pdo_pgsql` never falls through to a shorter fragment.
const DRIVER_FRAGMENTS: [(&str, &str); 9] = [
    ("pgsql", POSTGRESQL),
    ("postgres", POSTGRESQL),
    ("mysql", MYSQL),
    ("maria", MYSQL),
    ("sqlite", SQLITE),
    ("sqlsrv", SQLSERVER),
    ("mssql", SQLSERVER),
    ("sqlserver", SQLSERVER),
    ("dblib", SQLSERVER),
];

/// Maps a live connection to a concrete engine token.
///
/// Returns [`DATABASE`] when neither the platform name nor the driver
/// identifier is recognized.
pub fn resolve(connection: &ConnectionDescriptor) -> &'static str {
    connection
        .platform
        .as_deref()
        .and_then(resolve_platform)
        .or_else(|| connection.driver.as_deref().and_then(resolve_driver))
        .unwrap_or(DATABASE)
}

fn resolve_platform(platform: &str) -> Option<&'static str> {
    let platform = platform.trim().to_ascii_lowercase();
    // Versioned dialect names such as `postgresql94`.
    let unversioned = platform.trim_end_matches(|c: char| c.is_ascii_digit());
    PLATFORMS
        .iter()
        .find(|(name, _)| *name == platform || *name == unversioned)
        .map(|(_, engine)| *engine)
}

fn resolve_driver(driver: &str) -> Option<&'static str> {
    let driver = driver.to_ascii_lowercase();
    DRIVER_FRAGMENTS
        .iter()
        .find(|(fragment, _)| driver.contains(fragment))
        .map(|(_, engine)| *engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_platform(platform: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::default().with_platform(platform)
    }

    fn with_driver(driver: &str) -> ConnectionDescriptor {
        ConnectionDescriptor::default().with_driver(driver)
    }

    #[test]
    fn platform_names() {
        assert_eq!(resolve(&with_platform("PostgreSQL")), POSTGRESQL);
        assert_eq!(resolve(&with_platform("postgresql94")), POSTGRESQL);
        assert_eq!(resolve(&with_platform("mariadb")), MYSQL);
        assert_eq!(resolve(&with_platform("mssql")), SQLSERVER);
        assert_eq!(resolve(&with_platform("sqlite")), SQLITE);
    }

    #[test]
    fn driver_fragments_when_platform_missing() {
        assert_eq!(resolve(&with_driver("pdo_pgsql")), POSTGRESQL);
        assert_eq!(resolve(&with_driver("pdo_mysql")), MYSQL);
        assert_eq!(resolve(&with_driver("mysqli")), MYSQL);
        assert_eq!(resolve(&with_driver("pdo_sqlsrv")), SQLSERVER);
        assert_eq!(resolve(&with_driver("pdo_sqlite")), SQLITE);
    }

    #[test]
    fn unknown_platform_falls_back_to_driver() {
        let connection = with_platform("oracle").with_driver("pdo_pgsql");
        assert_eq!(resolve(&connection), POSTGRESQL);
    }

    #[test]
    fn inconclusive_yields_generic_token() {
        assert_eq!(resolve(&ConnectionDescriptor::default()), DATABASE);
        assert_eq!(resolve(&with_platform("oracle").with_driver("oci8")), DATABASE);
    }
}
