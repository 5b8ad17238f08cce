use macros::loggable;

loggable! {
    SystemLog {
        #[error("Initializing")]
        Initializing => tracing::Level::INFO,

        #[error("Initialization completed")]
        InitializeComplete => tracing::Level::INFO,

        #[error("Online now")]
        Online => tracing::Level::INFO,

        #[error("Shutdown requested")]
        ShutdownRequested => tracing::Level::INFO,

        #[error("Termination in process")]
        Terminating => tracing::Level::INFO,

        #[error("Termination completed")]
        TerminateComplete => tracing::Level::INFO,
    }
}
