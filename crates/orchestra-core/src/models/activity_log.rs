use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLogLevel {
    Info,
    Warn,
    Error,
}

impl ActivityLogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityLogLevel::Info => "info",
            ActivityLogLevel::Warn => "warn",
            ActivityLogLevel::Error => "error",
        }
    }
}

/// Audit trail entry written by agents with persistent side effects
/// (currently only report generation).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActivityLogRecord {
    pub log_type: String,
    pub entity_id: String,
    pub action: String,
    pub details: Value,
    pub level: ActivityLogLevel,
    pub created_at: DateTime<Utc>,
}

impl ActivityLogRecord {
    pub fn info(
        log_type: impl Into<String>,
        entity_id: impl Into<String>,
        action: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            log_type: log_type.into(),
            entity_id: entity_id.into(),
            action: action.into(),
            details,
            level: ActivityLogLevel::Info,
            created_at: Utc::now(),
        }
    }
}
