use macros::loggable;

loggable! {
    DatabaseLog {
        #[error("Connected to database successfully")]
        DatabaseConnectSuccess => tracing::Level::INFO,

        #[error("Loaded {count} backup records from the index")]
        IndexLoaded { count: usize } => tracing::Level::INFO,
    }
}
