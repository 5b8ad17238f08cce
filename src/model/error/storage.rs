use macros::traceable;

traceable! {
    StorageError {
        #[error("Failed to store {key}: {err}")]
        StoreFailed { key: String } => tracing::Level::ERROR,

        #[error("Failed to retrieve {key}: {err}")]
        RetrieveFailed { key: String } => tracing::Level::ERROR,

        #[error("Failed to delete {key}: {err}")]
        DeleteFailed { key: String } => tracing::Level::ERROR,

        #[error("Failed to list storage objects: {err}")]
        ListFailed => tracing::Level::ERROR,

        #[no_source]
        #[error("Storage object not found: {key}")]
        ObjectNotFound { key: String } => tracing::Level::WARN,

        #[no_source]
        #[error("Invalid storage key: {key}")]
        InvalidKey { key: String } => tracing::Level::WARN,

        #[error("Failed to build object store client: {err}")]
        BuildClientFailed => tracing::Level::ERROR,
    }
}
