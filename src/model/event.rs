use crate::model::backup_configuration::BackupConfiguration;
use crate::model::backup_result::BackupResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum BackupEventKind {
    PreBackup,
    PostBackup,
    BackupFailed,
    PreRestore,
    PostRestore,
    RestoreFailed,
}

impl BackupEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackupEventKind::PreBackup => "pre-backup",
            BackupEventKind::PostBackup => "post-backup",
            BackupEventKind::BackupFailed => "backup-failed",
            BackupEventKind::PreRestore => "pre-restore",
            BackupEventKind::PostRestore => "post-restore",
            BackupEventKind::RestoreFailed => "restore-failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, BackupEventKind::BackupFailed | BackupEventKind::RestoreFailed)
    }
}

impl fmt::Display for BackupEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle notification emitted by the backup manager.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct BackupEvent {
    pub kind: BackupEventKind,
    pub configuration: BackupConfiguration,
    pub result: Option<BackupResult>,
    /// Backup being restored, for restore events.
    pub backup_id: Option<Uuid>,
    pub error: Option<String>,
}

impl BackupEvent {
    pub fn new(kind: BackupEventKind, configuration: &BackupConfiguration) -> Self {
        Self {
            kind,
            configuration: configuration.clone(),
            result: None,
            backup_id: None,
            error: None,
        }
    }

    pub fn with_result(mut self, result: &BackupResult) -> Self {
        self.error = result.error().map(str::to_string);
        self.result = Some(result.clone());
        self
    }

    pub fn with_backup_id(mut self, backup_id: Uuid) -> Self {
        self.backup_id = Some(backup_id);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}
