use std::sync::Arc;

use serde_json::{Value, json};

use crate::models::{AgentType, CoreError, Parameters, PaymentStatus};
use crate::persistence::{RecordStore, run_blocking};

/// Revenue analysis over every recorded payment.
pub struct FinanceAgent {
    store: Arc<dyn RecordStore>,
}

impl FinanceAgent {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn execute(&self, action: &str, parameters: &Parameters) -> Result<Value, CoreError> {
        let _ = parameters;
        match action {
            "analyze_financials" => self.analyze_financials().await,
            _ => Err(CoreError::unknown_action(AgentType::Finance, action)),
        }
    }

    pub(crate) async fn analyze_financials(&self) -> Result<Value, CoreError> {
        tracing::info!("finance agent: analyzing financials");

        let store = Arc::clone(&self.store);
        let payments = run_blocking("list_payments", move || store.list_payments())
            .await
            .map_err(|error| {
                CoreError::agent_execution(
                    AgentType::Finance,
                    "analyze_financials",
                    error.to_string(),
                )
            })?;

        let completed: Vec<_> = payments
            .iter()
            .filter(|payment| payment.status == PaymentStatus::Completed)
            .collect();
        let pending: Vec<_> = payments
            .iter()
            .filter(|payment| payment.status.counts_as_pending())
            .collect();

        let total_revenue: f64 = completed.iter().map(|payment| payment.amount).sum();
        let pending_revenue: f64 = pending.iter().map(|payment| payment.amount).sum();

        Ok(json!({
            "period": "all_time",
            "revenue": {
                "total": total_revenue,
                "pending": pending_revenue,
                "completed_transactions": completed.len(),
                "pending_transactions": pending.len(),
            },
            "projections": {
                "next_month": total_revenue * 1.15,
                "next_quarter": total_revenue * 3.5,
            },
            "recommendations": [
                "Strong revenue growth detected",
                "Consider expanding payment options",
                "Optimize for higher-value transactions",
            ],
            "status": "success",
        }))
    }
}
