use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StrategyMode {
    Aggressive,
    #[default]
    Balanced,
    Conservative,
}

/// The driver's own targets, used as the base for daily suggestions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverProfile {
    pub strategy_mode: StrategyMode,
    pub min_dollars_per_mile: f64,
    pub min_trip_payout: f64,
    pub max_unpaid_pickup_distance_miles: f64,
    pub target_hourly_rate: f64,
    pub max_daily_hours: f64,
}

impl Default for DriverProfile {
    fn default() -> Self {
        Self {
            strategy_mode: StrategyMode::Balanced,
            min_dollars_per_mile: 1.5,
            min_trip_payout: 8.0,
            max_unpaid_pickup_distance_miles: 5.0,
            target_hourly_rate: 25.0,
            max_daily_hours: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlanInputs {
    pub today_goal_earnings: f64,
    pub today_available_hours: f64,
    pub strategy_mode: StrategyMode,
}
