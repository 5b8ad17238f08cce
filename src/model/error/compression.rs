use macros::traceable;
use std::path::PathBuf;

traceable! {
    CompressionError {
        #[error("Failed to compress {path}: {err}")]
        CompressFailed { path: PathBuf } => tracing::Level::ERROR,

        #[error("Failed to decompress {path}: {err}")]
        DecompressFailed { path: PathBuf } => tracing::Level::ERROR,

        #[no_source]
        #[error("Unsupported compression source: {path}")]
        UnsupportedSource { path: PathBuf } => tracing::Level::WARN,

        #[no_source]
        #[error("Archive has no entries: {path}")]
        EmptyArchive { path: PathBuf } => tracing::Level::WARN,
    }
}
