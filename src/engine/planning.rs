use crate::error::AppError;
use crate::models::preferences::PreferencesPatch;
use crate::models::profile::{DriverProfile, PlanInputs, StrategyMode};

const MIN_DOLLARS_PER_MILE_FLOOR: f64 = 1.0;
const MIN_TRIP_PAYOUT_FLOOR: f64 = 6.0;
const MAX_PICKUP_MILES_CAP: f64 = 10.0;
/// Pickup multipliers are expressed relative to the balanced radius.
const BALANCED_PICKUP_MILES: f64 = 5.0;

struct Multipliers {
    min_rate: f64,
    min_payout: f64,
    max_pickup: f64,
}

fn multipliers(mode: StrategyMode) -> Multipliers {
    match mode {
        StrategyMode::Aggressive => Multipliers {
            min_rate: 1.3,
            min_payout: 0.8,
            max_pickup: 8.0,
        },
        StrategyMode::Balanced => Multipliers {
            min_rate: 1.0,
            min_payout: 1.0,
            max_pickup: 5.0,
        },
        StrategyMode::Conservative => Multipliers {
            min_rate: 0.8,
            min_payout: 1.2,
            max_pickup: 3.0,
        },
    }
}

/// Derives today's targets from the driver's profile, earnings goal and
/// available hours.
pub fn suggest_preferences(
    personal: &DriverProfile,
    inputs: &PlanInputs,
) -> Result<DriverProfile, AppError> {
    if !inputs.today_available_hours.is_finite() || inputs.today_available_hours <= 0.0 {
        return Err(AppError::BadRequest(
            "today_available_hours must be > 0".to_string(),
        ));
    }
    if !inputs.today_goal_earnings.is_finite() || inputs.today_goal_earnings < 0.0 {
        return Err(AppError::BadRequest(
            "today_goal_earnings must be >= 0".to_string(),
        ));
    }

    let m = multipliers(inputs.strategy_mode);

    Ok(DriverProfile {
        strategy_mode: inputs.strategy_mode,
        min_dollars_per_mile: (personal.min_dollars_per_mile * m.min_rate)
            .max(MIN_DOLLARS_PER_MILE_FLOOR),
        min_trip_payout: (personal.min_trip_payout * m.min_payout).max(MIN_TRIP_PAYOUT_FLOOR),
        max_unpaid_pickup_distance_miles: (personal.max_unpaid_pickup_distance_miles
            * (m.max_pickup / BALANCED_PICKUP_MILES))
            .min(MAX_PICKUP_MILES_CAP),
        target_hourly_rate: inputs.today_goal_earnings / inputs.today_available_hours,
        max_daily_hours: inputs.today_available_hours,
    })
}

/// The parts of a profile Uno acts on: the payout floor and the daily cap.
pub fn automation_patch(profile: &DriverProfile) -> PreferencesPatch {
    PreferencesPatch {
        min_payout: Some(profile.min_trip_payout),
        max_daily_hours: Some(profile.max_daily_hours),
        ..PreferencesPatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::{automation_patch, suggest_preferences};
    use crate::error::AppError;
    use crate::models::profile::{DriverProfile, PlanInputs, StrategyMode};

    fn inputs(mode: StrategyMode) -> PlanInputs {
        PlanInputs {
            today_goal_earnings: 200.0,
            today_available_hours: 8.0,
            strategy_mode: mode,
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn balanced_keeps_personal_targets() {
        let personal = DriverProfile::default();
        let plan = suggest_preferences(&personal, &inputs(StrategyMode::Balanced)).unwrap();

        assert_eq!(plan.strategy_mode, StrategyMode::Balanced);
        assert!(close(plan.min_dollars_per_mile, 1.5));
        assert!(close(plan.min_trip_payout, 8.0));
        assert!(close(plan.max_unpaid_pickup_distance_miles, 5.0));
        assert!(close(plan.target_hourly_rate, 25.0));
        assert!(close(plan.max_daily_hours, 8.0));
    }

    #[test]
    fn aggressive_and_conservative_scale_targets() {
        let personal = DriverProfile::default();

        let aggressive = suggest_preferences(&personal, &inputs(StrategyMode::Aggressive)).unwrap();
        assert!(close(aggressive.min_dollars_per_mile, 1.95));
        assert!(close(aggressive.min_trip_payout, 6.4));
        assert!(close(aggressive.max_unpaid_pickup_distance_miles, 8.0));

        let conservative =
            suggest_preferences(&personal, &inputs(StrategyMode::Conservative)).unwrap();
        assert!(close(conservative.min_dollars_per_mile, 1.2));
        assert!(close(conservative.min_trip_payout, 9.6));
        assert!(close(conservative.max_unpaid_pickup_distance_miles, 3.0));
    }

    #[test]
    fn floors_and_caps_apply() {
        let personal = DriverProfile {
            min_dollars_per_mile: 0.5,
            min_trip_payout: 5.0,
            max_unpaid_pickup_distance_miles: 9.0,
            ..DriverProfile::default()
        };
        let plan = suggest_preferences(&personal, &inputs(StrategyMode::Aggressive)).unwrap();

        assert!(close(plan.min_dollars_per_mile, 1.0));
        assert!(close(plan.min_trip_payout, 6.0));
        assert!(close(plan.max_unpaid_pickup_distance_miles, 10.0));
    }

    #[test]
    fn zero_available_hours_is_rejected() {
        let mut plan_inputs = inputs(StrategyMode::Balanced);
        plan_inputs.today_available_hours = 0.0;
        assert!(matches!(
            suggest_preferences(&DriverProfile::default(), &plan_inputs),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn patch_carries_payout_floor_and_hour_cap() {
        let plan =
            suggest_preferences(&DriverProfile::default(), &inputs(StrategyMode::Conservative))
                .unwrap();
        let patch = automation_patch(&plan);

        assert_eq!(patch.min_payout, Some(plan.min_trip_payout));
        assert_eq!(patch.max_daily_hours, Some(8.0));
        assert!(patch.enabled.is_none());
        assert!(patch.working_hours.is_none());
    }
}
