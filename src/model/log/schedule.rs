use chrono::{DateTime, Utc};
use macros::loggable;

loggable! {
    ScheduleLog {
        #[error("Schedule {name} triggered")]
        ScheduleTriggered { name: String } => tracing::Level::INFO,

        #[error("Schedule {name} next run at {next_run}")]
        ScheduleAdvanced { name: String, next_run: DateTime<Utc> } => tracing::Level::DEBUG,

        #[error("Schedule {name} is still running, skipped")]
        ScheduleBusy { name: String } => tracing::Level::WARN,

        #[error("Schedule timer stopped")]
        TimerStopped => tracing::Level::INFO,
    }
}
