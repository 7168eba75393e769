pub mod executor;
pub mod gateway;
pub mod worker_pool;

pub use executor::TaskExecutor;
pub use gateway::DispatchGateway;
pub use worker_pool::{WorkerPool, WorkerQueue};

use crate::models::{AgentType, Parameters, Priority};

/// Validated dispatch request. Construction requires an already-parsed
/// [`AgentType`], so a submission can never reference an unknown agent.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSubmission {
    pub agent_type: AgentType,
    pub action: String,
    pub parameters: Parameters,
    pub priority: Priority,
}

impl TaskSubmission {
    pub fn new(
        agent_type: AgentType,
        action: impl Into<String>,
        parameters: Parameters,
        priority: Priority,
    ) -> Self {
        Self {
            agent_type,
            action: action.into(),
            parameters,
            priority,
        }
    }
}
