use crate::core::backup_manager::BackupManager;
use crate::core::infrastructure::database_manager::DatabaseManager;
use crate::interface::repository::schedule::ScheduleRepository;
use crate::model::backup_result::BackupResult;
use crate::model::backup_schedule::BackupSchedule;
use crate::model::config::ScheduleConfig;
use crate::model::error::Error;
use crate::model::log::schedule::ScheduleLog;
use crate::model::retention::RetentionPolicy;
use chrono::{DateTime, Utc};
use dashmap::{DashMap, DashSet};
use macros::log;
use std::sync::Arc;

/// Holds the configured schedules and runs the due ones through the
/// [`BackupManager`]. Run state is persisted so `next_run` survives restarts.
pub struct ScheduleManager {
    backup_manager: Arc<BackupManager>,
    database_manager: Option<Arc<DatabaseManager>>,
    retention: Option<RetentionPolicy>,
    schedules: DashMap<String, BackupSchedule>,
    running: DashSet<String>,
}

impl ScheduleManager {
    pub async fn new(
        backup_manager: Arc<BackupManager>,
        database_manager: Option<Arc<DatabaseManager>>,
        retention: Option<RetentionPolicy>,
        schedules: Vec<BackupSchedule>,
    ) -> Result<Self, Error> {
        let loaded = DashMap::new();
        for mut schedule in schedules {
            if let Some(database_manager) = &database_manager {
                if let Some(state) = database_manager.get_schedule_state(&schedule.name).await? {
                    schedule.restore_state(&state);
                }
            }
            loaded.insert(schedule.name.clone(), schedule);
        }
        Ok(Self {
            backup_manager,
            database_manager,
            retention,
            schedules: loaded,
            running: DashSet::new(),
        })
    }

    /// Turns configured entries into schedules. Without an explicit first
    /// run, the first slot is the next one after `now`.
    pub fn from_config(configs: &[ScheduleConfig], now: DateTime<Utc>) -> Result<Vec<BackupSchedule>, Error> {
        configs
            .iter()
            .map(|config| -> Result<BackupSchedule, Error> {
                let next_run = match config.first_run {
                    Some(first_run) => first_run,
                    None => config.frequency.next_after(now)?,
                };
                let mut configuration = config.backup.clone();
                if configuration.name.is_empty() {
                    configuration.name = config.name.clone();
                }
                Ok(BackupSchedule {
                    name: config.name.clone(),
                    configuration,
                    frequency: config.frequency.clone(),
                    next_run,
                    last_run: None,
                    enabled: config.enabled,
                })
            })
            .collect()
    }

    pub fn get_all_schedules(&self) -> Vec<BackupSchedule> {
        let mut schedules: Vec<BackupSchedule> = self
            .schedules
            .iter()
            .map(|schedule| schedule.value().clone())
            .collect();
        schedules.sort_by(|a, b| a.name.cmp(&b.name));
        schedules
    }

    pub fn get_schedule(&self, name: &str) -> Option<BackupSchedule> {
        self.schedules.get(name).map(|schedule| schedule.value().clone())
    }

    /// Returns whether the schedule exists.
    pub fn set_enabled(&self, name: &str, enabled: bool) -> bool {
        match self.schedules.get_mut(name) {
            Some(mut schedule) => {
                schedule.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Earliest `next_run` among enabled schedules.
    pub fn next_wakeup(&self) -> Option<DateTime<Utc>> {
        self.schedules
            .iter()
            .filter(|schedule| schedule.enabled)
            .map(|schedule| schedule.next_run)
            .min()
    }

    /// Runs every due schedule one after another, oldest slot first.
    pub async fn execute_ready_schedules(&self, now: DateTime<Utc>) -> Vec<BackupResult> {
        let mut due: Vec<(String, DateTime<Utc>)> = self
            .schedules
            .iter()
            .filter(|schedule| schedule.is_due(now))
            .map(|schedule| (schedule.name.clone(), schedule.next_run))
            .collect();
        due.sort_by(|a, b| a.1.cmp(&b.1));

        let mut results = Vec::new();
        for (name, _) in due {
            if let Some(result) = self.run_schedule(&name, now).await {
                results.push(result);
            }
        }
        results
    }

    /// Runs one schedule now. `None` when it is unknown or already running.
    pub async fn run_schedule(&self, name: &str, now: DateTime<Utc>) -> Option<BackupResult> {
        let configuration = self.get_schedule(name)?.configuration;
        if !self.running.insert(name.to_string()) {
            log!(ScheduleLog::ScheduleBusy {
                name: name.to_string()
            });
            return None;
        }
        log!(ScheduleLog::ScheduleTriggered {
            name: name.to_string()
        });
        let result = self.backup_manager.backup(configuration.clone()).await;

        if let Err(err) = self.advance(name, now).await {
            log!(err);
        }
        if let Some(retention) = &self.retention {
            self.backup_manager
                .apply_retention(retention, Some(&configuration.name))
                .await;
        }
        self.running.remove(name);
        Some(result)
    }

    async fn advance(&self, name: &str, now: DateTime<Utc>) -> Result<(), Error> {
        let state = match self.schedules.get_mut(name) {
            Some(mut schedule) => {
                schedule.advance(now)?;
                schedule.state()
            }
            None => return Ok(()),
        };
        log!(ScheduleLog::ScheduleAdvanced {
            name: name.to_string(),
            next_run: state.next_run,
        });
        if let Some(database_manager) = &self.database_manager {
            database_manager.save_schedule_state(&state).await?;
        }
        Ok(())
    }
}
