use macros::traceable;

traceable! {
    MiscError {
        #[error("Failed to serialize: {err}")]
        SerializeError => tracing::Level::ERROR,

        #[error("Failed to deserialize: {err}")]
        DeserializeError => tracing::Level::ERROR,

        #[error("Invalid schedule frequency {frequency}: {err}")]
        InvalidFrequency { frequency: String } => tracing::Level::ERROR,
    }
}
