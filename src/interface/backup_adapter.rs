use crate::interface::ThreadSafe;
use crate::model::backup_configuration::{BackupConfiguration, Options};
use crate::model::backup_result::BackupResult;
use crate::model::connection::ConnectionDescriptor;
use crate::model::error::Error;
use async_trait::async_trait;
use std::path::Path;

/// Produces a raw artifact from a source (a database engine or a set of
/// directories) and applies such an artifact back.
#[async_trait]
pub trait BackupAdapter: ThreadSafe {
    fn name(&self) -> &str;

    /// Whether this adapter handles the given type token.
    fn supports(&self, backup_type: &str) -> bool;

    /// Human readable problems with the configuration, empty when valid.
    fn validate(&self, configuration: &BackupConfiguration) -> Vec<String>;

    /// Writes the artifact next to `stem`, adding the adapter's own
    /// extension, and returns a successful result pointing at it.
    ///
    /// On error no artifact is left at the returned location.
    async fn backup(
        &self,
        configuration: &BackupConfiguration,
        stem: &Path,
    ) -> Result<BackupResult, Error>;

    async fn restore(&self, file_path: &Path, options: &Options) -> Result<(), Error>;

    /// The live connection, for adapters backed by one.
    fn connection(&self) -> Option<&ConnectionDescriptor> {
        None
    }
}
