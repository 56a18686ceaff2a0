use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};
use tracing::{debug, info, warn};

use crate::engine::lifecycle;
use crate::engine::safety::safety_status;
use crate::engine::scoring::Uno;
use crate::models::decision::{Action, Decision};
use crate::models::job::Job;
use crate::models::preferences::AutomationPreferences;
use crate::models::safety::{DutyHours, SafetySettings};
use crate::notify::{Notification, Notifier};
use crate::state::AppState;

/// Evaluates every job up front, then hands each decision to `on_decision`
/// in input order, sleeping `pacing` between items. Returns one decision per
/// job, in input order.
pub async fn process_batch<F>(
    uno: &Uno,
    jobs: &[Job],
    now: DateTime<Utc>,
    pacing: Duration,
    mut on_decision: F,
) -> Vec<Decision>
where
    F: FnMut(&Job, &Decision),
{
    let decisions: Vec<Decision> = jobs.iter().map(|job| uno.evaluate(job, now)).collect();

    for (idx, (job, decision)) in jobs.iter().zip(&decisions).enumerate() {
        on_decision(job, decision);

        if idx + 1 < jobs.len() && !pacing.is_zero() {
            sleep(pacing).await;
        }
    }

    decisions
}

/// Why the worker should leave an offer for the driver instead of scoring
/// it, if it should.
pub fn hold_reason(
    prefs: &AutomationPreferences,
    safety: &SafetySettings,
    hours: &DutyHours,
    job: &Job,
) -> Option<String> {
    if let Some(max_payout) = prefs.max_payout {
        if job.driver_share > max_payout {
            return Some(format!(
                "Payout (${}) exceeds maximum (${})",
                job.driver_share, max_payout
            ));
        }
    }

    if let Some(zone_id) = &job.zone {
        match prefs.zones.iter().find(|zone| &zone.id == zone_id) {
            Some(zone) if zone.enabled => {}
            Some(zone) => return Some(format!("Zone {} is disabled", zone.name)),
            None => return Some(format!("Unknown zone {zone_id}")),
        }
    }

    if hours.today_on_duty_hours >= prefs.max_daily_hours {
        return Some(format!(
            "Daily limit of {}h on duty reached",
            prefs.max_daily_hours
        ));
    }

    if safety.allow_ai_to_block_jobs_when_over_hours
        && !safety_status(safety, hours).can_accept_more_driving
    {
        return Some("Driving hour limits reached".to_string());
    }

    None
}

/// Records a decision and carries out accept / bid on the driver's behalf.
pub fn apply_decision(state: &AppState, job: &Job, decision: &Decision) {
    info!(
        job_id = %job.id,
        action = ?decision.action,
        score = decision.score,
        confidence = decision.confidence,
        "uno decision"
    );
    for reason in &decision.reasons {
        debug!(job_id = %job.id, reason = %reason, "uno reason");
    }

    let label = match decision.action {
        Action::Accept => "accept",
        Action::Bid => "bid",
        Action::Decline => "decline",
    };
    state
        .metrics
        .jobs_evaluated_total
        .with_label_values(&[label])
        .inc();
    state.decisions.insert(job.id, decision.clone());

    let outcome = match decision.action {
        Action::Accept => lifecycle::accept(state, job.id, Utc::now()).map(|_| ()),
        Action::Bid => {
            let amount = decision.bid_amount.unwrap_or(job.driver_share);
            lifecycle::place_bid(state, job.id, amount).map(|_| ())
        }
        Action::Decline => {
            info!(job_id = %job.id, "job declined");
            return;
        }
    };

    match outcome {
        Ok(()) => state
            .notifier
            .notify(Notification::uno_action(job, decision.action)),
        Err(err) => warn!(job_id = %job.id, error = %err, "automated action failed"),
    }
}

pub async fn run_automation_engine(state: Arc<AppState>, mut job_rx: mpsc::Receiver<Job>) {
    info!("automation engine started");

    while let Some(job) = job_rx.recv().await {
        state.metrics.jobs_in_queue.dec();
        state.notifier.notify(Notification::new_job(&job));

        let start = Instant::now();
        let uno = state.uno.read().await.clone();
        let prefs = uno.preferences();

        if !(prefs.enabled && (prefs.auto_accept || prefs.auto_bid)) {
            state
                .metrics
                .evaluation_latency_seconds
                .with_label_values(&["skipped"])
                .observe(start.elapsed().as_secs_f64());
            continue;
        }

        let now = Utc::now();
        let safety = state.safety.read().await.clone();
        let hours = state.duty_hours(now).await;
        if let Some(reason) = hold_reason(prefs, &safety, &hours, &job) {
            info!(job_id = %job.id, reason = %reason, "offer held for the driver");
            state
                .metrics
                .evaluation_latency_seconds
                .with_label_values(&["held"])
                .observe(start.elapsed().as_secs_f64());
            continue;
        }

        let decision = uno.evaluate(&job, now);
        apply_decision(&state, &job, &decision);

        state
            .metrics
            .evaluation_latency_seconds
            .with_label_values(&["evaluated"])
            .observe(start.elapsed().as_secs_f64());

        if !state.batch_pacing.is_zero() {
            sleep(state.batch_pacing).await;
        }
    }

    warn!("automation engine stopped: queue channel closed");
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{hold_reason, process_batch};
    use crate::engine::scoring::tests::{job, monday_at, now, prefs};
    use crate::engine::scoring::Uno;
    use crate::models::decision::Action;
    use crate::models::safety::{DutyHours, SafetySettings};

    #[tokio::test]
    async fn batch_keeps_input_order_and_length() {
        let uno = Uno::new(prefs());
        let jobs = vec![
            job(25.0, 5.0, monday_at(10, 0)),
            job(1.0, 100.0, monday_at(10, 0)),
            job(10.0, 5.0, monday_at(10, 0)),
        ];

        let mut seen = Vec::new();
        let decisions = process_batch(&uno, &jobs, now(), Duration::ZERO, |job, _| {
            seen.push(job.id)
        })
        .await;

        assert_eq!(decisions.len(), jobs.len());
        for (job, decision) in jobs.iter().zip(&decisions) {
            assert_eq!(decision.job_id, job.id);
        }
        assert_eq!(seen, jobs.iter().map(|j| j.id).collect::<Vec<_>>());

        let actions: Vec<Action> = decisions.iter().map(|d| d.action).collect();
        assert_eq!(actions, vec![Action::Accept, Action::Decline, Action::Bid]);
    }

    #[tokio::test]
    async fn batch_paces_between_items() {
        let uno = Uno::new(prefs());
        let jobs = vec![
            job(25.0, 5.0, monday_at(10, 0)),
            job(25.0, 5.0, monday_at(10, 0)),
            job(25.0, 5.0, monday_at(10, 0)),
        ];

        let started = std::time::Instant::now();
        let decisions =
            process_batch(&uno, &jobs, now(), Duration::from_millis(20), |_, _| {}).await;

        assert_eq!(decisions.len(), 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn empty_batch_returns_nothing() {
        let uno = Uno::new(prefs());
        let decisions = process_batch(&uno, &[], now(), Duration::from_millis(500), |_, _| {}).await;
        assert!(decisions.is_empty());
    }

    #[test]
    fn ordinary_offer_is_not_held() {
        let offer = job(25.0, 5.0, monday_at(10, 0));
        let safety = SafetySettings::default();
        assert_eq!(hold_reason(&prefs(), &safety, &DutyHours::default(), &offer), None);
    }

    #[test]
    fn payout_over_ceiling_is_held() {
        let safety = SafetySettings::default();
        let hours = DutyHours::default();
        let mut preferences = prefs();
        preferences.max_payout = Some(100.0);
        let offer = job(150.0, 5.0, monday_at(10, 0));

        assert_eq!(
            hold_reason(&preferences, &safety, &hours, &offer).as_deref(),
            Some("Payout ($150) exceeds maximum ($100)")
        );

        preferences.max_payout = None;
        assert!(hold_reason(&preferences, &safety, &hours, &offer).is_none());
    }

    #[test]
    fn disabled_or_unknown_zone_is_held() {
        let safety = SafetySettings::default();
        let hours = DutyHours::default();
        let mut offer = job(25.0, 5.0, monday_at(10, 0));

        offer.zone = Some("zone-airport".to_string());
        assert!(hold_reason(&prefs(), &safety, &hours, &offer).is_none());

        offer.zone = Some("zone-coastal".to_string());
        assert_eq!(
            hold_reason(&prefs(), &safety, &hours, &offer).as_deref(),
            Some("Zone Coastal is disabled")
        );

        offer.zone = Some("zone-moon".to_string());
        assert!(hold_reason(&prefs(), &safety, &hours, &offer).is_some());
    }

    #[test]
    fn daily_cap_and_safety_limits_hold_offers() {
        let offer = job(25.0, 5.0, monday_at(10, 0));
        let mut safety = SafetySettings::default();

        let long_shift = DutyHours {
            today_on_duty_hours: 10.0,
            ..DutyHours::default()
        };
        assert_eq!(
            hold_reason(&prefs(), &safety, &long_shift, &offer).as_deref(),
            Some("Daily limit of 10h on duty reached")
        );

        let long_drive = DutyHours {
            today_driving_hours: 11.0,
            ..DutyHours::default()
        };
        assert_eq!(
            hold_reason(&prefs(), &safety, &long_drive, &offer).as_deref(),
            Some("Driving hour limits reached")
        );

        safety.allow_ai_to_block_jobs_when_over_hours = false;
        assert!(hold_reason(&prefs(), &safety, &long_drive, &offer).is_none());
    }
}
