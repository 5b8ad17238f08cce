use macros::traceable;

traceable! {
    DatabaseError {
        #[error("Failed to create database: {err}")]
        CreateDatabaseFailed => tracing::Level::ERROR,

        #[error("Failed to connect to database: {err}")]
        DatabaseConnectFailed => tracing::Level::ERROR,

        #[error("Failed to lock database: {err}")]
        LockDatabaseFailed => tracing::Level::ERROR,

        #[error("Failed to execute SQL statement: {err}")]
        StatementExecutionFailed => tracing::Level::ERROR,

        #[no_source]
        #[error("Database data corrupted")]
        DataCorrupted => tracing::Level::ERROR,
    }
}
