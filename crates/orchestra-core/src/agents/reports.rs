use std::sync::Arc;

use chrono::Utc;
use serde_json::{Value, json};

use crate::agents::{AnalyticsAgent, FinanceAgent, param_or};
use crate::models::{ActivityLogRecord, AgentType, CoreError, Parameters};
use crate::persistence::{RecordStore, run_blocking};

/// Composes the analytics and finance views into one business report and
/// records the generation in the activity log.
pub struct ReportsAgent {
    analytics: AnalyticsAgent,
    finance: FinanceAgent,
    store: Arc<dyn RecordStore>,
}

impl ReportsAgent {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            analytics: AnalyticsAgent::new(Arc::clone(&store)),
            finance: FinanceAgent::new(Arc::clone(&store)),
            store,
        }
    }

    pub async fn execute(&self, action: &str, parameters: &Parameters) -> Result<Value, CoreError> {
        match action {
            "generate_report" => self.generate_report(parameters).await,
            _ => Err(CoreError::unknown_action(AgentType::Reports, action)),
        }
    }

    async fn generate_report(&self, parameters: &Parameters) -> Result<Value, CoreError> {
        tracing::info!("reports agent: generating report");

        let report_type = param_or(parameters, "report_type", "daily_summary").to_string();

        let analytics_data = self.analytics.analyze_data().await?;
        let finance_data = self.finance.analyze_financials().await?;

        let revenue = finance_data["revenue"]["total"].clone();
        let tasks_completed = analytics_data["metrics"]["completed_tasks"].clone();

        let result = json!({
            "report_type": report_type,
            "generated_at": Utc::now().to_rfc3339(),
            "sections": {
                "executive_summary": {
                    "status": "Excellent",
                    "key_metrics": {
                        "revenue": revenue,
                        "tasks_completed": tasks_completed,
                        "growth": "+23%",
                    },
                },
                "analytics": analytics_data,
                "financials": finance_data,
                "ai_recommendations": [
                    "Continue current growth strategy",
                    "Invest in automation infrastructure",
                    "Expand to new market segments",
                ],
            },
            "status": "success",
        });

        // The report itself is the task result; a failed audit write must not
        // fail the report.
        let entry = ActivityLogRecord::info(
            "report_generated",
            report_type,
            "generate_report",
            result.clone(),
        );
        let store = Arc::clone(&self.store);
        if let Err(error) = run_blocking("append_log", move || store.append_log(&entry)).await {
            tracing::error!(%error, "failed to store generated report in activity log");
        }

        Ok(result)
    }
}
