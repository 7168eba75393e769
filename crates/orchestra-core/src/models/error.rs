use thiserror::Error;

use crate::models::{AgentType, TaskId};

#[derive(Clone, Debug, Error, PartialEq)]
pub enum CoreError {
    /// Dispatch-time caller error; never produces a task record.
    #[error("invalid agent type '{0}'")]
    InvalidAgentType(String),

    /// Execution-time error: the agent type exists but the action does not.
    #[error("unknown action '{action}' for agent type '{agent_type}'")]
    UnknownAgentAction { agent_type: AgentType, action: String },

    /// Failure raised by a resolved agent while computing its result.
    #[error("agent '{agent_type}.{action}' failed: {message}")]
    AgentExecution {
        agent_type: AgentType,
        action: String,
        message: String,
    },

    #[error("persistence operation '{operation}' failed: {message}")]
    Persistence { operation: String, message: String },

    #[error("unknown task id '{0}'")]
    NotFound(TaskId),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn persistence(operation: impl Into<String>, message: impl Into<String>) -> Self {
        CoreError::Persistence {
            operation: operation.into(),
            message: message.into(),
        }
    }

    pub fn agent_execution(
        agent_type: AgentType,
        action: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CoreError::AgentExecution {
            agent_type,
            action: action.into(),
            message: message.into(),
        }
    }

    pub fn unknown_action(agent_type: AgentType, action: impl Into<String>) -> Self {
        CoreError::UnknownAgentAction {
            agent_type,
            action: action.into(),
        }
    }
}
