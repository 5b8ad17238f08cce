use crate::core::app_config::AppConfig;
use crate::core::backup_manager::BackupManager;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::core::infrastructure::event_dispatcher::{EventDispatcher, TracingEventListener};
use crate::core::infrastructure::process_runner::TokioProcessRunner;
use crate::core::manager_config::ManagerConfig;
use crate::core::schedule::schedule_manager::ScheduleManager;
use crate::core::schedule::schedule_timer::ScheduleTimer;
use crate::interface::event_sink::EventListener;
use crate::model::error::Error;
use crate::model::error::system::SystemError;
use crate::model::log::system::SystemLog;
use crate::platform::constants::LOG_DIR;
use crate::utils::logging::Logging;
use chrono::Utc;
use macros::log;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;

pub struct System {
    app_config: Arc<AppConfig>,
    database_manager: Arc<DatabaseManager>,
    event_dispatcher: Arc<EventDispatcher>,
    backup_manager: Arc<BackupManager>,
    schedule_timer: Arc<ScheduleTimer>,
    timer: Option<(oneshot::Sender<()>, JoinHandle<()>)>,
    _log_guard: WorkerGuard,
}

impl System {
    pub async fn initialize() -> Result<Self, Error> {
        let log_guard = Logging::initialize(Path::new(LOG_DIR))?;
        log!(SystemLog::Initializing);

        let app_config = Arc::new(AppConfig::new()?);
        let database_manager = Arc::new(DatabaseManager::new(&app_config.index_path).await?);
        let event_dispatcher = Arc::new(EventDispatcher::new(
            vec![Arc::new(TracingEventListener) as Arc<dyn EventListener>],
            Duration::from_secs(app_config.event_timeout),
        ));

        let manager_config = ManagerConfig::from_config(&app_config, Arc::new(TokioProcessRunner))?
            .with_database_manager(database_manager.clone())
            .with_event_sink(event_dispatcher.clone());
        let backup_manager = Arc::new(BackupManager::new(manager_config).await?);

        let schedules = ScheduleManager::from_config(&app_config.schedules, Utc::now())?;
        let schedule_manager = ScheduleManager::new(
            backup_manager.clone(),
            Some(database_manager.clone()),
            app_config.retention,
            schedules,
        )
        .await?;
        let wakeup = Duration::from_secs(app_config.default_wakeup_time.unsigned_abs());
        let schedule_timer = Arc::new(ScheduleTimer::new(Arc::new(schedule_manager), wakeup));

        log!(SystemLog::InitializeComplete);
        Ok(Self {
            app_config,
            database_manager,
            event_dispatcher,
            backup_manager,
            schedule_timer,
            timer: None,
            _log_guard: log_guard,
        })
    }

    pub fn app_config(&self) -> Arc<AppConfig> {
        self.app_config.clone()
    }

    pub fn backup_manager(&self) -> Arc<BackupManager> {
        self.backup_manager.clone()
    }

    /// Starts the schedule timer and blocks until Ctrl-C.
    pub async fn run(&mut self) -> Result<(), Error> {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(self.schedule_timer.clone().run(shutdown_rx));
        self.timer = Some((shutdown_tx, handle));
        log!(SystemLog::Online);

        tokio::signal::ctrl_c()
            .await
            .map_err(|_| SystemError::ShutdownSignalFailed)?;
        log!(SystemLog::ShutdownRequested);
        Ok(())
    }

    pub async fn terminate(mut self) {
        log!(SystemLog::Terminating);
        if let Some((shutdown_tx, handle)) = self.timer.take() {
            if shutdown_tx.send(()).is_err() {
                log!(SystemError::ShutdownSignalFailed);
            }
            if let Err(err) = handle.await {
                log!(SystemError::thread_panic(err));
            }
        }
        self.event_dispatcher.close().await;
        self.database_manager.close().await;
        log!(SystemLog::TerminateComplete);
    }
}
