use crate::core::schedule::schedule_manager::ScheduleManager;
use crate::model::log::schedule::ScheduleLog;
use chrono::{DateTime, Utc};
use macros::log;
use std::sync::Arc;
use std::time::Duration;
use tokio::select;
use tokio::sync::Notify;
use tokio::sync::oneshot::Receiver;
use tokio::time::sleep;

/// Wakes up for the earliest due schedule, or every `default_wakeup_time`
/// when nothing is scheduled sooner.
pub struct ScheduleTimer {
    schedule_manager: Arc<ScheduleManager>,
    default_wakeup_time: Duration,
    refresh_notify: Notify,
}

impl ScheduleTimer {
    pub fn new(schedule_manager: Arc<ScheduleManager>, default_wakeup_time: Duration) -> Self {
        Self {
            schedule_manager,
            default_wakeup_time,
            refresh_notify: Notify::new(),
        }
    }

    /// Recomputes the sleep after schedules changed.
    pub fn refresh(&self) {
        self.refresh_notify.notify_one();
    }

    fn sleep_duration(&self, now: DateTime<Utc>) -> Duration {
        match self.schedule_manager.next_wakeup() {
            Some(next_run) => (next_run - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(self.default_wakeup_time),
            None => self.default_wakeup_time,
        }
    }

    pub async fn run(self: Arc<Self>, mut shutdown_rx: Receiver<()>) {
        loop {
            let sleep_time = self.sleep_duration(Utc::now());
            select! {
                biased;
                _ = &mut shutdown_rx => break,
                _ = self.refresh_notify.notified() => continue,
                _ = sleep(sleep_time) => {}
            }
            self.schedule_manager
                .execute_ready_schedules(Utc::now())
                .await;
        }
        log!(ScheduleLog::TimerStopped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backup_manager::BackupManager;
    use crate::core::manager_config::ManagerConfig;
    use crate::model::backup_configuration::BackupConfiguration;
    use crate::model::backup_schedule::{BackupSchedule, Frequency};
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;
    use tokio::sync::oneshot;

    async fn timer(dir: &TempDir, next_run: Option<DateTime<Utc>>) -> Arc<ScheduleTimer> {
        let backup_manager = Arc::new(
            BackupManager::new(ManagerConfig::new(dir.path()))
                .await
                .unwrap(),
        );
        let schedules = next_run
            .map(|next_run| BackupSchedule {
                name: "nightly".to_string(),
                configuration: BackupConfiguration::new("filesystem"),
                frequency: Frequency::Daily,
                next_run,
                last_run: None,
                enabled: true,
            })
            .into_iter()
            .collect();
        let schedule_manager = ScheduleManager::new(backup_manager, None, None, schedules)
            .await
            .unwrap();
        Arc::new(ScheduleTimer::new(
            Arc::new(schedule_manager),
            Duration::from_secs(60),
        ))
    }

    #[tokio::test]
    async fn sleep_is_bounded_by_wakeup_time() {
        let dir = TempDir::new().unwrap();
        let now = Utc::now();

        let idle = timer(&dir, None).await;
        assert_eq!(idle.sleep_duration(now), Duration::from_secs(60));

        let soon = timer(&dir, Some(now + ChronoDuration::seconds(10))).await;
        assert_eq!(soon.sleep_duration(now), Duration::from_secs(10));

        let overdue = timer(&dir, Some(now - ChronoDuration::seconds(10))).await;
        assert_eq!(overdue.sleep_duration(now), Duration::ZERO);
    }

    #[tokio::test]
    async fn stops_on_shutdown() {
        let dir = TempDir::new().unwrap();
        let timer = timer(&dir, None).await;
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(timer.clone().run(shutdown_rx));
        timer.refresh();
        shutdown_tx.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
