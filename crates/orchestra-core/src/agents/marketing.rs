use chrono::Utc;
use serde_json::{Value, json};

use crate::agents::param_or;
use crate::models::{AgentType, CoreError, Parameters};

/// Content generation and campaign analysis. Purely computational; the
/// underlying generation is simulated pending a model integration.
#[derive(Default)]
pub struct MarketingAgent;

impl MarketingAgent {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(&self, action: &str, parameters: &Parameters) -> Result<Value, CoreError> {
        match action {
            "generate_content" => Ok(self.generate_content(parameters)),
            "analyze_campaign" => Ok(self.analyze_campaign(parameters)),
            _ => Err(CoreError::unknown_action(AgentType::Marketing, action)),
        }
    }

    fn generate_content(&self, parameters: &Parameters) -> Value {
        tracing::info!("marketing agent: generating content");

        let content_type = param_or(parameters, "content_type", "social_media");
        let topic = param_or(parameters, "topic", "business automation");

        json!({
            "content_type": content_type,
            "topic": topic,
            "generated_content": format!("AI-generated {content_type} content about {topic}"),
            "status": "success",
            "generated_at": Utc::now().to_rfc3339(),
        })
    }

    fn analyze_campaign(&self, parameters: &Parameters) -> Value {
        tracing::info!("marketing agent: analyzing campaign");

        let campaign_id = param_or(parameters, "campaign_id", "default");

        json!({
            "campaign_id": campaign_id,
            "metrics": {
                "reach": 10000,
                "engagement": 850,
                "conversions": 125,
                "roi": 2.5,
            },
            "insights": [
                "Campaign performing above average",
                "Best performing time: 2-4 PM",
                "Top channel: Email",
            ],
            "status": "success",
        })
    }
}
