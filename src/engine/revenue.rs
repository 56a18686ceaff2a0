use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: f64 = 500.0;
pub const STANDARD_MILEAGE_RATE: f64 = 0.67;

const SHARED_TIER_RATE: f64 = 0.5;
const REDUCED_TIER_RATE: f64 = 0.1;
const REDUCED_TIER_DRIVER_RATE: f64 = 0.9;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RevenueShare {
    pub app_share: f64,
    pub driver_share: f64,
    pub has_reached_threshold: bool,
}

/// Splits `gross_revenue` between platform and driver given the platform
/// share already collected this month.
///
/// Below `threshold` the split is 50/50; once the month's platform share has
/// reached it the platform keeps 10%. An increment that straddles the
/// threshold caps the platform share at what is left of the 50/50 tier and
/// gives the driver the rest; the excess is not re-split at 10%.
///
/// No rounding is applied.
pub fn calculate_monthly_revenue_share(
    gross_revenue: f64,
    app_share_so_far: f64,
    threshold: f64,
) -> RevenueShare {
    if app_share_so_far >= threshold {
        return RevenueShare {
            app_share: gross_revenue * REDUCED_TIER_RATE,
            driver_share: gross_revenue * REDUCED_TIER_DRIVER_RATE,
            has_reached_threshold: true,
        };
    }

    let remaining = threshold - app_share_so_far;
    let half = gross_revenue * SHARED_TIER_RATE;

    if half <= remaining {
        return RevenueShare {
            app_share: half,
            driver_share: gross_revenue - half,
            has_reached_threshold: false,
        };
    }

    RevenueShare {
        app_share: remaining,
        driver_share: gross_revenue - remaining,
        has_reached_threshold: app_share_so_far + remaining >= threshold,
    }
}

pub fn mileage_deduction(miles: f64) -> f64 {
    miles * STANDARD_MILEAGE_RATE
}

/// Month-to-date revenue accumulator. Rolls over on the first booking of a
/// new calendar month (UTC).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RevenueLedger {
    pub year: i32,
    pub month: u32,
    pub gross: f64,
    pub app_share: f64,
    pub driver_share: f64,
    pub threshold: f64,
    pub has_reached_threshold: bool,
}

impl RevenueLedger {
    pub fn new(threshold: f64, at: DateTime<Utc>) -> Self {
        Self {
            year: at.year(),
            month: at.month(),
            gross: 0.0,
            app_share: 0.0,
            driver_share: 0.0,
            threshold,
            has_reached_threshold: false,
        }
    }

    fn roll_over(&mut self, at: DateTime<Utc>) {
        if self.year != at.year() || self.month != at.month() {
            *self = Self::new(self.threshold, at);
        }
    }

    /// Books one gross fare and returns the split applied to it.
    pub fn record(&mut self, gross_revenue: f64, at: DateTime<Utc>) -> RevenueShare {
        self.roll_over(at);

        let share = calculate_monthly_revenue_share(gross_revenue, self.app_share, self.threshold);
        self.gross += gross_revenue;
        self.app_share += share.app_share;
        self.driver_share += share.driver_share;
        self.has_reached_threshold = self.app_share >= self.threshold;
        share
    }

    /// Snapshot as of `at`; a stale month reads as empty.
    pub fn snapshot(&self, at: DateTime<Utc>) -> Self {
        let mut current = self.clone();
        current.roll_over(at);
        current
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{calculate_monthly_revenue_share, mileage_deduction, RevenueLedger, DEFAULT_THRESHOLD};

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn increment_inside_shared_tier_splits_evenly() {
        let share = calculate_monthly_revenue_share(300.0, 300.0, DEFAULT_THRESHOLD);
        assert!(approx(share.app_share, 150.0));
        assert!(approx(share.driver_share, 150.0));
        assert!(!share.has_reached_threshold);
    }

    #[test]
    fn exactly_filling_the_tier_stays_in_it() {
        let share = calculate_monthly_revenue_share(1_000.0, 0.0, DEFAULT_THRESHOLD);
        assert!(approx(share.app_share, 500.0));
        assert!(approx(share.driver_share, 500.0));
        assert!(!share.has_reached_threshold);
    }

    #[test]
    fn straddling_increment_caps_platform_share() {
        let share = calculate_monthly_revenue_share(200.0, 480.0, DEFAULT_THRESHOLD);
        assert!(approx(share.app_share, 20.0));
        assert!(approx(share.driver_share, 180.0));
        assert!(share.has_reached_threshold);
    }

    #[test]
    fn past_threshold_platform_keeps_ten_percent() {
        let share = calculate_monthly_revenue_share(100.0, 500.0, DEFAULT_THRESHOLD);
        assert!(approx(share.app_share, 10.0));
        assert!(approx(share.driver_share, 90.0));
        assert!(share.has_reached_threshold);
    }

    #[test]
    fn custom_threshold_is_respected() {
        let share = calculate_monthly_revenue_share(100.0, 0.0, 20.0);
        assert!(approx(share.app_share, 20.0));
        assert!(approx(share.driver_share, 80.0));
    }

    #[test]
    fn mileage_deduction_uses_standard_rate() {
        assert!(approx(mileage_deduction(100.0), 67.0));
    }

    #[test]
    fn ledger_accumulates_and_switches_tier() {
        let june = Utc.with_ymd_and_hms(2025, 6, 10, 9, 0, 0).unwrap();
        let mut ledger = RevenueLedger::new(DEFAULT_THRESHOLD, june);

        ledger.record(900.0, june);
        assert!(approx(ledger.app_share, 450.0));
        assert!(!ledger.has_reached_threshold);

        let crossing = ledger.record(200.0, june);
        assert!(approx(crossing.app_share, 50.0));
        assert!(ledger.has_reached_threshold);

        let reduced = ledger.record(100.0, june);
        assert!(approx(reduced.app_share, 10.0));
        assert!(approx(ledger.gross, 1_200.0));
        assert!(approx(ledger.app_share, 510.0));
    }

    #[test]
    fn ledger_resets_on_new_month() {
        let june = Utc.with_ymd_and_hms(2025, 6, 30, 23, 0, 0).unwrap();
        let july = Utc.with_ymd_and_hms(2025, 7, 1, 0, 30, 0).unwrap();
        let mut ledger = RevenueLedger::new(DEFAULT_THRESHOLD, june);

        ledger.record(1_200.0, june);
        assert!(ledger.has_reached_threshold);
        assert!(approx(ledger.snapshot(july).app_share, 0.0));

        let first_july = ledger.record(100.0, july);
        assert!(approx(first_july.app_share, 50.0));
        assert_eq!(ledger.month, 7);
        assert!(approx(ledger.gross, 100.0));
    }
}
