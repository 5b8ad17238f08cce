use macros::traceable;
use std::path::PathBuf;

traceable! {
    IOError {
        #[error("Failed to create directory {path}: {err}")]
        CreateDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to create file {path}: {err}")]
        CreateFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to read file {path}: {err}")]
        ReadFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to write file {path}: {err}")]
        WriteFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to delete file {path}: {err}")]
        DeleteFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to delete directory {path}: {err}")]
        DeleteDirectoryFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to get file metadata {path}: {err}")]
        GetMetadataFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to lock file {path}: {err}")]
        LockFileFailed { path: PathBuf } => tracing::Level::ERROR,

        #[no_source]
        #[error("File does not exist: {path}")]
        FileDoesNotExist { path: PathBuf } => tracing::Level::ERROR,
    }
}
