pub mod filesystem;
pub mod mysql;
pub mod postgresql;
pub mod sqlite;
pub mod sqlserver;

use crate::interface::compression_adapter::append_suffix;
use crate::model::backup_configuration::BackupConfiguration;
use crate::model::backup_result::BackupResult;
use crate::model::backup_type::{is_generic_database, normalize};
use crate::model::error::Error;
use crate::model::error::adapter::AdapterError;
use crate::model::error::io::IOError;
use crate::utils::artifact::remove_path;
use std::path::{Path, PathBuf};

pub(crate) fn artifact_path(stem: &Path, extension: &str) -> PathBuf {
    append_suffix(stem, &format!(".{extension}"))
}

/// Wraps a finished artifact into a successful result.
pub(crate) async fn finish(path: &Path, engine: &str) -> Result<BackupResult, Error> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) => {
            remove_path(path).await;
            Err(IOError::get_metadata_failed(path, err))?
        }
    };
    let mut result = BackupResult::success(path.to_string_lossy(), Some(metadata.len()));
    result.insert_metadata("engine", engine);
    Ok(result)
}

/// Runs a dump step, deleting its output when the step fails.
pub(crate) async fn or_discard<T>(
    output: &Path,
    step: impl Future<Output = Result<T, Error>>,
) -> Result<T, Error> {
    match step.await {
        Ok(value) => Ok(value),
        Err(err) => {
            remove_path(output).await;
            Err(err)
        }
    }
}

pub(crate) fn required<'a>(value: Option<&'a str>, parameter: &str) -> Result<&'a str, Error> {
    match value.filter(|value| !value.is_empty()) {
        Some(value) => Ok(value),
        None => Err(AdapterError::missing_connection_parameter(parameter).into()),
    }
}

/// True for the generic database token and for any of the engine's own names.
pub(crate) fn supports_engine(backup_type: &str, names: &[&str]) -> bool {
    let token = normalize(backup_type);
    is_generic_database(&token) || names.contains(&token.as_str())
}

pub(crate) fn validate_output(configuration: &BackupConfiguration, problems: &mut Vec<String>) {
    let empty = configuration
        .output_path
        .as_ref()
        .is_none_or(|path| path.as_os_str().is_empty());
    if empty {
        problems.push("output path is not set".to_string());
    }
}
