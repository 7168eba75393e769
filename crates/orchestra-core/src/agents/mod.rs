pub mod analytics;
pub mod finance;
pub mod marketing;
pub mod reports;

pub use analytics::AnalyticsAgent;
pub use finance::FinanceAgent;
pub use marketing::MarketingAgent;
pub use reports::ReportsAgent;

use std::sync::Arc;

use serde_json::Value;

use crate::models::{AgentType, CoreError, Parameters};
use crate::persistence::RecordStore;

/// Closed set of executable agents. Adding an agent means adding a variant
/// here and a matching [`AgentType`], so dispatch can never reach an agent
/// the registry does not know about.
pub enum Agent {
    Marketing(MarketingAgent),
    Analytics(AnalyticsAgent),
    Finance(FinanceAgent),
    Reports(ReportsAgent),
    /// Placeholder partition with no registered actions.
    General,
}

impl Agent {
    pub async fn execute(&self, action: &str, parameters: &Parameters) -> Result<Value, CoreError> {
        match self {
            Agent::Marketing(agent) => agent.execute(action, parameters).await,
            Agent::Analytics(agent) => agent.execute(action, parameters).await,
            Agent::Finance(agent) => agent.execute(action, parameters).await,
            Agent::Reports(agent) => agent.execute(action, parameters).await,
            Agent::General => Err(CoreError::unknown_action(AgentType::General, action)),
        }
    }
}

/// Maps each [`AgentType`] to its agent. Built once at startup and shared
/// read-only by every worker.
pub struct AgentRegistry {
    marketing: Agent,
    analytics: Agent,
    finance: Agent,
    reports: Agent,
    general: Agent,
}

impl AgentRegistry {
    pub fn with_builtins(store: Arc<dyn RecordStore>) -> Self {
        Self {
            marketing: Agent::Marketing(MarketingAgent::new()),
            analytics: Agent::Analytics(AnalyticsAgent::new(Arc::clone(&store))),
            finance: Agent::Finance(FinanceAgent::new(Arc::clone(&store))),
            reports: Agent::Reports(ReportsAgent::new(store)),
            general: Agent::General,
        }
    }

    pub fn agent(&self, agent_type: AgentType) -> &Agent {
        match agent_type {
            AgentType::Marketing => &self.marketing,
            AgentType::Analytics => &self.analytics,
            AgentType::Finance => &self.finance,
            AgentType::Reports => &self.reports,
            AgentType::General => &self.general,
        }
    }

    pub async fn execute(
        &self,
        agent_type: AgentType,
        action: &str,
        parameters: &Parameters,
    ) -> Result<Value, CoreError> {
        self.agent(agent_type).execute(action, parameters).await
    }
}

pub(crate) fn param_or<'a>(parameters: &'a Parameters, key: &str, default: &'a str) -> &'a str {
    parameters
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
}
