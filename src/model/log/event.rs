use macros::loggable;

loggable! {
    EventLog {
        #[error("Lifecycle event {kind}")]
        EventDispatched { kind: String } => tracing::Level::INFO,

        #[error("Event listener timed out on {kind}")]
        ListenerTimedOut { kind: String } => tracing::Level::WARN,

        #[error("Event queue closed, {kind} dropped")]
        EventDropped { kind: String } => tracing::Level::WARN,
    }
}
