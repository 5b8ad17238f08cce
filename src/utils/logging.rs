use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "backup-sphere.log";

pub struct Logging;

impl Logging {
    /// Installs stdout and daily rolling file output.
    ///
    /// The returned guard flushes the file writer when dropped, keep it alive
    /// for as long as the process logs.
    pub fn initialize(log_dir: &Path) -> Result<WorkerGuard, Error> {
        std::fs::create_dir_all(log_dir)
            .map_err(|err| IOError::create_directory_failed(log_dir, err))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
        let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .with(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(file_writer),
            )
            .try_init()
            .map_err(SystemError::logging_init_failed)?;

        log_panics::Config::new()
            .backtrace_mode(log_panics::BacktraceMode::Resolved)
            .install_panic_hook();

        Ok(guard)
    }
}
