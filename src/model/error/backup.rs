use macros::traceable;

traceable! {
    BackupError {
        #[no_source]
        #[error("Invalid backup configuration: {reason}")]
        InvalidConfiguration { reason: String } => tracing::Level::WARN,

        #[no_source]
        #[error("No adapter supports backup type: {backup_type}")]
        UnsupportedType { backup_type: String } => tracing::Level::WARN,

        #[no_source]
        #[error("Database type could not be resolved from the connection")]
        UnresolvedDatabaseType => tracing::Level::WARN,

        #[no_source]
        #[error("Backup not found: {id}")]
        BackupNotFound { id: String } => tracing::Level::WARN,

        #[no_source]
        #[error("Storage adapter not registered: {name}")]
        StorageNotRegistered { name: String } => tracing::Level::ERROR,

        #[no_source]
        #[error("Compression adapter not registered: {name}")]
        CompressionNotRegistered { name: String } => tracing::Level::ERROR,

        #[no_source]
        #[error("Checksum mismatch for backup {id}")]
        ChecksumMismatch { id: String } => tracing::Level::ERROR,
    }
}
