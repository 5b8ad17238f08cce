use crate::model::backup_configuration::BackupConfiguration;
use crate::model::error::Error;
use crate::model::error::misc::MiscError;
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(try_from = "String", into = "String")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    /// Cron expression with a leading seconds field.
    Cron(String),
}

impl Frequency {
    pub fn next_after(&self, from: DateTime<Utc>) -> Result<DateTime<Utc>, Error> {
        let next = match self {
            Frequency::Daily => from + Duration::days(1),
            Frequency::Weekly => from + Duration::days(7),
            Frequency::Monthly => from
                .checked_add_months(Months::new(1))
                .unwrap_or(from + Duration::days(30)),
            Frequency::Cron(expression) => {
                let schedule = cron::Schedule::from_str(expression)
                    .map_err(|err| MiscError::invalid_frequency(expression.clone(), err))?;
                schedule.after(&from).next().ok_or_else(|| {
                    MiscError::invalid_frequency(expression.clone(), "no upcoming occurrence")
                })?
            }
        };
        Ok(next)
    }
}

impl FromStr for Frequency {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => {
                cron::Schedule::from_str(value.trim())
                    .map_err(|err| MiscError::invalid_frequency(value, err))?;
                Ok(Frequency::Cron(value.trim().to_string()))
            }
        }
    }
}

impl TryFrom<String> for Frequency {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Frequency> for String {
    fn from(frequency: Frequency) -> Self {
        frequency.to_string()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::Daily => f.write_str("daily"),
            Frequency::Weekly => f.write_str("weekly"),
            Frequency::Monthly => f.write_str("monthly"),
            Frequency::Cron(expression) => f.write_str(expression),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BackupSchedule {
    pub name: String,
    pub configuration: BackupConfiguration,
    pub frequency: Frequency,
    pub next_run: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
    pub enabled: bool,
}

impl BackupSchedule {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.enabled && self.next_run <= now
    }

    /// Records a run at `now` and moves `next_run` past it, skipping missed slots.
    pub fn advance(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        let mut next_run = self.frequency.next_after(self.next_run)?;
        while next_run <= now {
            next_run = self.frequency.next_after(next_run)?;
        }
        self.last_run = Some(now);
        self.next_run = next_run;
        Ok(())
    }

    pub fn state(&self) -> ScheduleState {
        ScheduleState {
            name: self.name.clone(),
            next_run: self.next_run,
            last_run: self.last_run,
        }
    }

    /// Resumes from persisted run state. A slot missed while offline stays due.
    pub fn restore_state(&mut self, state: &ScheduleState) {
        self.last_run = state.last_run;
        self.next_run = state.next_run;
    }
}

/// Persisted run state of a schedule, keyed by name.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ScheduleState {
    pub name: String,
    pub next_run: DateTime<Utc>,
    pub last_run: Option<DateTime<Utc>>,
}
