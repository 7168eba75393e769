use serde::Deserialize;

use crate::models::CoreError;

/// Runtime tuning for the orchestration core. All fields have defaults, so
/// deserializing an empty document yields a working configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// Concurrent task workers.
    pub workers: usize,
    /// Queued task ids before dispatch backpressures.
    pub queue_capacity: usize,
    pub scheduler_enabled: bool,
    /// Daily report trigger as "HH:MM" in UTC.
    pub daily_report_time: String,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 64,
            scheduler_enabled: true,
            daily_report_time: "09:00".to_string(),
        }
    }
}

impl CoreConfig {
    /// Parses `daily_report_time` into an `(hour, minute)` pair.
    pub fn daily_report_trigger(&self) -> Result<(u32, u32), CoreError> {
        let (hour_raw, minute_raw) = self.daily_report_time.split_once(':').ok_or_else(|| {
            CoreError::InvalidConfig(format!(
                "daily_report_time '{}' must use 'HH:MM' format",
                self.daily_report_time
            ))
        })?;

        let hour: u32 = hour_raw.parse().map_err(|_| {
            CoreError::InvalidConfig(format!(
                "daily_report_time '{}' has a malformed hour",
                self.daily_report_time
            ))
        })?;
        let minute: u32 = minute_raw.parse().map_err(|_| {
            CoreError::InvalidConfig(format!(
                "daily_report_time '{}' has a malformed minute",
                self.daily_report_time
            ))
        })?;

        if hour > 23 || minute > 59 {
            return Err(CoreError::InvalidConfig(format!(
                "daily_report_time '{}' is out of range",
                self.daily_report_time
            )));
        }

        Ok((hour, minute))
    }
}
