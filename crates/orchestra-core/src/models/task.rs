use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::models::CoreError;

/// Open key/value mapping handed verbatim to the invoked agent.
pub type Parameters = Map<String, Value>;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(pub Uuid);

impl TaskId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Closed set of registry partitions an action can belong to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Marketing,
    Analytics,
    Finance,
    Reports,
    General,
}

impl AgentType {
    pub const ALL: [AgentType; 5] = [
        AgentType::Marketing,
        AgentType::Analytics,
        AgentType::Finance,
        AgentType::Reports,
        AgentType::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Marketing => "marketing",
            AgentType::Analytics => "analytics",
            AgentType::Finance => "finance",
            AgentType::Reports => "reports",
            AgentType::General => "general",
        }
    }
}

impl Display for AgentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentType {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "marketing" => Ok(AgentType::Marketing),
            "analytics" => Ok(AgentType::Analytics),
            "finance" => Ok(AgentType::Finance),
            "reports" => Ok(AgentType::Reports),
            "general" => Ok(AgentType::General),
            _ => Err(CoreError::InvalidAgentType(raw.to_string())),
        }
    }
}

/// Advisory only; preserved on the record but never reorders execution.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            _ => Err(CoreError::InvalidConfig(format!(
                "unknown priority '{raw}'"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl Display for TaskStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted unit of work. Identity never changes after creation; only
/// status, result, error, and timestamps mutate, and exactly one of
/// result/error is populated once the record leaves `in_progress`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub agent_type: AgentType,
    pub action: String,
    pub parameters: Parameters,
    pub priority: Priority,
    pub status: TaskStatus,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskRecord {
    pub fn new(
        agent_type: AgentType,
        action: impl Into<String>,
        parameters: Parameters,
        priority: Priority,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: TaskId::new(),
            agent_type,
            action: action.into(),
            parameters,
            priority,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    pub fn apply(&mut self, update: &TaskUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(result) = &update.result {
            self.result = Some(result.clone());
        }
        if let Some(error) = &update.error {
            self.error = Some(error.clone());
        }
        if let Some(updated_at) = update.updated_at {
            self.updated_at = updated_at;
        }
        if let Some(completed_at) = update.completed_at {
            self.completed_at = Some(completed_at);
        }
    }
}

/// Partial-field update accepted by the store's `update_task` operation.
/// Absent fields keep their persisted value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub result: Option<Value>,
    pub error: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl TaskUpdate {
    pub fn in_progress(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::InProgress),
            updated_at: Some(now),
            ..Self::default()
        }
    }

    pub fn completed(result: Value, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Completed),
            result: Some(result),
            updated_at: Some(now),
            completed_at: Some(now),
            ..Self::default()
        }
    }

    pub fn failed(message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            status: Some(TaskStatus::Failed),
            error: Some(message.into()),
            updated_at: Some(now),
            completed_at: Some(now),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_type_round_trips_through_wire_names() {
        for agent_type in AgentType::ALL {
            assert_eq!(agent_type.as_str().parse::<AgentType>().unwrap(), agent_type);
        }
    }

    #[test]
    fn unknown_agent_type_is_rejected() {
        let error = "nonexistent".parse::<AgentType>().unwrap_err();
        assert_eq!(error, CoreError::InvalidAgentType("nonexistent".to_string()));
    }

    #[test]
    fn terminal_update_sets_completion_stamp() {
        let mut record = TaskRecord::new(
            AgentType::Marketing,
            "generate_content",
            Parameters::new(),
            Priority::Medium,
        );
        assert_eq!(record.status, TaskStatus::Pending);
        assert!(record.completed_at.is_none());

        let now = Utc::now();
        record.apply(&TaskUpdate::failed("boom", now));
        assert_eq!(record.status, TaskStatus::Failed);
        assert_eq!(record.error.as_deref(), Some("boom"));
        assert!(record.result.is_none());
        assert_eq!(record.completed_at, Some(now));
    }
}
