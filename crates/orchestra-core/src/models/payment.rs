use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::CoreError;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Completed,
    Pending,
    Created,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Completed => "completed",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Created => "created",
        }
    }

    /// A payment created but not yet captured counts toward pending revenue.
    pub fn counts_as_pending(&self) -> bool {
        matches!(self, PaymentStatus::Pending | PaymentStatus::Created)
    }
}

impl FromStr for PaymentStatus {
    type Err = CoreError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "completed" => Ok(PaymentStatus::Completed),
            "pending" => Ok(PaymentStatus::Pending),
            "created" => Ok(PaymentStatus::Created),
            _ => Err(CoreError::InvalidConfig(format!(
                "unknown payment status '{raw}'"
            ))),
        }
    }
}

/// Read-only transaction input consumed by the analytics and finance agents.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: Uuid,
    pub amount: f64,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn new(amount: f64, status: PaymentStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            status,
            created_at: Utc::now(),
        }
    }
}
