use macros::traceable;

traceable! {
    AdapterError {
        #[error("Failed to start {program}: {err}")]
        SpawnFailed { program: String } => tracing::Level::ERROR,

        #[error("{program} exited with failure: {err}")]
        CommandFailed { program: String } => tracing::Level::ERROR,

        #[no_source]
        #[error("{program} did not finish within {seconds}s")]
        CommandTimedOut { program: String, seconds: u64 } => tracing::Level::ERROR,

        #[no_source]
        #[error("Missing required option: {option}")]
        MissingOption { option: String } => tracing::Level::WARN,

        #[error("Invalid adapter options: {err}")]
        InvalidOptions => tracing::Level::WARN,

        #[no_source]
        #[error("Missing connection parameter: {parameter}")]
        MissingConnectionParameter { parameter: String } => tracing::Level::WARN,

        #[error("Failed to archive filesystem sources: {err}")]
        ArchiveFailed => tracing::Level::ERROR,

        #[error("Failed to extract archive into {target}: {err}")]
        ExtractFailed { target: std::path::PathBuf } => tracing::Level::ERROR,
    }
}
