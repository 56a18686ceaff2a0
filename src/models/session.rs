use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PunchSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub start_odometer: f64,
    pub end_odometer: Option<f64>,
    pub total_miles: Option<f64>,
    pub total_duration_secs: Option<i64>,
}

impl PunchSession {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }
}
