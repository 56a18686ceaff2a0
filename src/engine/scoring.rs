use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc, Weekday};

use crate::models::decision::{Action, Decision, DecisionSummary};
use crate::models::job::Job;
use crate::models::preferences::AutomationPreferences;

const BASE_SCORE: i32 = 100;
const ACCEPT_THRESHOLD: i32 = 80;
const BID_THRESHOLD: i32 = 50;

const HIGH_PAYOUT_FACTOR: f64 = 1.5;
const SHORT_DISTANCE_FACTOR: f64 = 0.6;
const STALE_LISTING_HOURS: f64 = 1.0;

/// Per-evaluation view of a job, with the pickup clock resolved once.
pub struct JobFacts<'a> {
    pub job: &'a Job,
    pub pickup_hour: u32,
    pub pickup_day: Weekday,
    pub pickup_date: NaiveDate,
    pub hours_listed: f64,
}

impl<'a> JobFacts<'a> {
    pub fn new(job: &'a Job, now: DateTime<Utc>) -> Self {
        let pickup = job.pickup_time;
        let listed = now.signed_duration_since(job.created_at);

        Self {
            job,
            pickup_hour: pickup.hour(),
            pickup_day: pickup.weekday(),
            pickup_date: pickup.date_naive(),
            hours_listed: listed.num_milliseconds() as f64 / 3_600_000.0,
        }
    }
}

type Check = fn(&JobFacts<'_>, &AutomationPreferences) -> Option<String>;

/// A rule adds `weight` to the score and contributes its reason when `check`
/// fires.
pub struct Rule {
    pub name: &'static str,
    pub weight: i32,
    check: Check,
}

pub const RULES: [Rule; 8] = [
    Rule {
        name: "payout_below_minimum",
        weight: -40,
        check: payout_below_minimum,
    },
    Rule {
        name: "distance_over_maximum",
        weight: -50,
        check: distance_over_maximum,
    },
    Rule {
        name: "day_off",
        weight: -100,
        check: day_off,
    },
    Rule {
        name: "unscheduled_day",
        weight: -80,
        check: unscheduled_day,
    },
    Rule {
        name: "outside_working_hours",
        weight: -70,
        check: outside_working_hours,
    },
    Rule {
        name: "high_payout",
        weight: 20,
        check: high_payout,
    },
    Rule {
        name: "short_distance",
        weight: 15,
        check: short_distance,
    },
    Rule {
        name: "stale_listing",
        weight: 10,
        check: stale_listing,
    },
];

fn payout_below_minimum(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    (facts.job.driver_share < prefs.min_payout).then(|| {
        format!(
            "Payout (${}) below minimum (${})",
            facts.job.driver_share, prefs.min_payout
        )
    })
}

fn distance_over_maximum(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    (facts.job.distance > prefs.max_distance).then(|| {
        format!(
            "Distance ({}mi) exceeds maximum ({}mi)",
            facts.job.distance, prefs.max_distance
        )
    })
}

fn day_off(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    let day_off = prefs.days_off.iter().find(|d| d.date == facts.pickup_date)?;
    Some(match &day_off.reason {
        Some(reason) => format!("Scheduled day off: {reason}"),
        None => "Scheduled day off".to_string(),
    })
}

/// Windows whose times do not parse are treated as absent.
fn window_bounds(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<(u32, u32, String)> {
    let window = prefs
        .working_hours
        .iter()
        .find(|w| w.day == facts.pickup_day)?;
    let (start, end) = window.hour_bounds()?;
    Some((start, end, format!("{} - {}", window.start_time, window.end_time)))
}

fn unscheduled_day(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    window_bounds(facts, prefs)
        .is_none()
        .then(|| "Not scheduled to work this day".to_string())
}

fn outside_working_hours(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    let (start, end, label) = window_bounds(facts, prefs)?;
    (facts.pickup_hour < start || facts.pickup_hour >= end)
        .then(|| format!("Outside working hours ({label})"))
}

fn high_payout(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    (facts.job.driver_share > prefs.min_payout * HIGH_PAYOUT_FACTOR)
        .then(|| "High payout premium".to_string())
}

fn short_distance(facts: &JobFacts<'_>, prefs: &AutomationPreferences) -> Option<String> {
    (facts.job.distance <= prefs.max_distance * SHORT_DISTANCE_FACTOR)
        .then(|| "Short distance bonus".to_string())
}

fn stale_listing(facts: &JobFacts<'_>, _prefs: &AutomationPreferences) -> Option<String> {
    (facts.hours_listed > STALE_LISTING_HOURS)
        .then(|| "Job has been available for a while".to_string())
}

/// Folds the rule table over one job. Returns the score and the reasons of
/// every fired rule, in table order.
pub fn score_job(
    job: &Job,
    prefs: &AutomationPreferences,
    now: DateTime<Utc>,
) -> (i32, Vec<String>) {
    let facts = JobFacts::new(job, now);

    RULES
        .iter()
        .fold((BASE_SCORE, Vec::new()), |(score, mut reasons), rule| {
            match (rule.check)(&facts, prefs) {
                Some(reason) => {
                    reasons.push(reason);
                    (score + rule.weight, reasons)
                }
                None => (score, reasons),
            }
        })
}

/// Discounted counter-offer derived from the evaluation confidence.
pub fn bid_amount(driver_share: f64, confidence: i32) -> f64 {
    let multiplier = if confidence >= 80 {
        0.95
    } else if confidence >= 60 {
        0.90
    } else {
        0.85
    };
    driver_share * multiplier
}

/// The automated job evaluator. Holds the driver's preferences and turns a
/// job offer into an accept / bid / decline decision.
#[derive(Debug, Clone, Default)]
pub struct Uno {
    preferences: AutomationPreferences,
}

impl Uno {
    pub fn new(preferences: AutomationPreferences) -> Self {
        Self { preferences }
    }

    pub fn preferences(&self) -> &AutomationPreferences {
        &self.preferences
    }

    pub fn update_preferences(&mut self, preferences: AutomationPreferences) {
        self.preferences = preferences;
    }

    pub fn evaluate(&self, job: &Job, now: DateTime<Utc>) -> Decision {
        let prefs = &self.preferences;

        if !prefs.enabled {
            return Decision {
                job_id: job.id,
                action: Action::Decline,
                score: 0,
                confidence: 100,
                reasons: vec!["Uno is currently disabled".to_string()],
                bid_amount: None,
                evaluated_at: now,
            };
        }

        let (score, fired) = score_job(job, prefs, now);

        // Offers that require a bid are never accepted outright.
        let can_accept = prefs.auto_accept && !job.requires_bid;

        let (action, confidence, summary) = if score >= ACCEPT_THRESHOLD && can_accept {
            (Action::Accept, score.min(100), "Excellent match for your criteria")
        } else if score >= BID_THRESHOLD && prefs.auto_bid {
            (Action::Bid, score, "Good opportunity for bidding")
        } else {
            (Action::Decline, 100 - score, "Does not meet criteria")
        };

        // Scoring is pure, so the bid confidence is the confidence just computed.
        let bid_amount = (action == Action::Bid).then(|| bid_amount(job.driver_share, confidence));

        let mut reasons = Vec::with_capacity(fired.len() + 1);
        reasons.push(summary.to_string());
        reasons.extend(fired);

        Decision {
            job_id: job.id,
            action,
            score,
            confidence,
            reasons,
            bid_amount,
            evaluated_at: now,
        }
    }

    pub fn summarize(decisions: &[Decision]) -> DecisionSummary {
        decisions
            .iter()
            .fold(DecisionSummary::default(), |mut summary, decision| {
                match decision.action {
                    Action::Accept => summary.accepted += 1,
                    Action::Bid => summary.bid += 1,
                    Action::Decline => summary.declined += 1,
                }
                summary
            })
    }
}
