use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    /// Backups older than this are pruned.
    #[serde(default)]
    pub max_age_days: Option<u32>,
    /// Newest backups always kept, whatever their age.
    #[serde(default)]
    pub keep_last: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetentionReport {
    pub removed: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}
