use macros::loggable;
use uuid::Uuid;

loggable! {
    BackupLog {
        #[error("Backup {name} started with type {backup_type}")]
        BackupStarted { name: String, backup_type: String } => tracing::Level::INFO,

        #[error("Backup {id} stored as {key} ({size} bytes)")]
        BackupCompleted { id: Uuid, key: String, size: u64 } => tracing::Level::INFO,

        #[error("Backup {name} failed: {reason}")]
        BackupFailed { name: String, reason: String } => tracing::Level::ERROR,

        #[error("Backup type {from} resolved to {to}")]
        TypeResolved { from: String, to: String } => tracing::Level::DEBUG,

        #[error("Database type is inconclusive, falling back to the first registered adapter")]
        ResolutionFallback => tracing::Level::WARN,

        #[error("Restore of backup {id} started")]
        RestoreStarted { id: Uuid } => tracing::Level::INFO,

        #[error("Restore of backup {id} completed")]
        RestoreCompleted { id: Uuid } => tracing::Level::INFO,

        #[error("Restore of backup {id} failed: {reason}")]
        RestoreFailed { id: String, reason: String } => tracing::Level::ERROR,

        #[error("Backup {id} deleted")]
        BackupDeleted { id: Uuid } => tracing::Level::INFO,

        #[error("Retention removed {removed} backups, {failed} failed")]
        RetentionApplied { removed: usize, failed: usize } => tracing::Level::INFO,

        #[error("Failed to clean up {path}")]
        CleanupFailed { path: String } => tracing::Level::WARN,
    }
}
