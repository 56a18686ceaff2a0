use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Accept,
    Bid,
    Decline,
}

/// Outcome of one Uno evaluation. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decision {
    pub job_id: Uuid,
    pub action: Action,
    /// Raw rule score before the action mapping.
    pub score: i32,
    /// `min(score, 100)` for accept, `score` for bid, `100 - score` for
    /// decline. Only the accept branch is clipped.
    pub confidence: i32,
    pub reasons: Vec<String>,
    pub bid_amount: Option<f64>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DecisionSummary {
    pub accepted: usize,
    pub bid: usize,
    pub declined: usize,
}
