use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::job::{Job, JobStatus};
use crate::state::AppState;

/// Optional measured values applied when a trip completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct TripActuals {
    pub distance: Option<f64>,
    pub duration: Option<f64>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("job {} not found", id))
}

fn invalid_transition(job: &Job, to: &str) -> AppError {
    AppError::Conflict(format!(
        "job {} is {:?} and cannot be {to}",
        job.id, job.status
    ))
}

pub fn accept(state: &AppState, id: Uuid, at: DateTime<Utc>) -> Result<Job, AppError> {
    let mut job = state.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
    if job.status != JobStatus::Pending {
        return Err(invalid_transition(&job, "accepted"));
    }
    if job.requires_bid && job.bid_amount.is_none() {
        return Err(AppError::Conflict(format!(
            "job {} requires a bid before it can be accepted",
            id
        )));
    }

    job.status = JobStatus::Assigned;
    job.accepted_at = Some(at);
    info!(job_id = %id, "job accepted");
    Ok(job.clone())
}

pub fn place_bid(state: &AppState, id: Uuid, amount: f64) -> Result<Job, AppError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::BadRequest("bid amount must be > 0".to_string()));
    }

    let mut job = state.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
    if job.status != JobStatus::Pending {
        return Err(invalid_transition(&job, "bid on"));
    }

    job.bid_amount = Some(amount);
    info!(job_id = %id, amount, "bid placed");
    Ok(job.clone())
}

pub fn start(state: &AppState, id: Uuid) -> Result<Job, AppError> {
    let mut job = state.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
    if job.status != JobStatus::Assigned {
        return Err(invalid_transition(&job, "started"));
    }

    job.status = JobStatus::EnRoute;
    info!(job_id = %id, "trip started");
    Ok(job.clone())
}

/// Completes an en-route trip and books its gross fare into the month's
/// revenue ledger.
pub async fn complete(
    state: &AppState,
    id: Uuid,
    actuals: TripActuals,
    at: DateTime<Utc>,
) -> Result<Job, AppError> {
    for value in [actuals.distance, actuals.duration].into_iter().flatten() {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(
                "actual distance and duration must be non-negative".to_string(),
            ));
        }
    }

    let completed = {
        let mut job = state.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
        if job.status != JobStatus::EnRoute {
            return Err(invalid_transition(&job, "completed"));
        }

        job.status = JobStatus::Completed;
        job.completed_at = Some(at);
        if let Some(distance) = actuals.distance {
            job.distance = distance;
        }
        if let Some(duration) = actuals.duration {
            job.duration = duration;
        }
        job.clone()
    };

    let mut ledger = state.ledger.lock().await;
    let share = ledger.record(completed.gross_fare, at);
    state
        .metrics
        .platform_share_month_to_date
        .set(ledger.app_share);

    info!(
        job_id = %id,
        gross = completed.gross_fare,
        app_share = share.app_share,
        driver_share = share.driver_share,
        "trip completed"
    );

    Ok(completed)
}

pub fn cancel(state: &AppState, id: Uuid, reason: String) -> Result<Job, AppError> {
    let mut job = state.jobs.get_mut(&id).ok_or_else(|| not_found(id))?;
    if job.status.is_terminal() {
        return Err(invalid_transition(&job, "cancelled"));
    }

    job.status = JobStatus::Cancelled;
    job.cancel_reason = Some(reason);
    info!(job_id = %id, "job cancelled");
    Ok(job.clone())
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{accept, cancel, complete, place_bid, start, TripActuals};
    use crate::engine::scoring::tests::{job, monday_at};
    use crate::error::AppError;
    use crate::models::job::JobStatus;
    use crate::state::AppState;

    fn state_with_job() -> (AppState, uuid::Uuid) {
        let (state, _rx) = AppState::in_memory(16, 16);
        let offer = job(20.0, 8.0, monday_at(10, 0));
        let id = offer.id;
        state.jobs.insert(id, offer);
        (state, id)
    }

    #[tokio::test]
    async fn full_lifecycle_books_revenue() {
        let (state, id) = state_with_job();

        accept(&state, id, Utc::now()).unwrap();
        start(&state, id).unwrap();
        let done = complete(
            &state,
            id,
            TripActuals {
                distance: Some(9.5),
                duration: None,
            },
            Utc::now(),
        )
        .await
        .unwrap();

        assert_eq!(done.status, JobStatus::Completed);
        assert_eq!(done.distance, 9.5);
        assert_eq!(done.duration, 20.0);
        assert!(done.completed_at.is_some());

        let ledger = state.ledger.lock().await;
        assert_eq!(ledger.gross, 40.0);
        assert_eq!(ledger.app_share, 20.0);
    }

    #[tokio::test]
    async fn completing_a_pending_job_conflicts() {
        let (state, id) = state_with_job();
        let result = complete(&state, id, TripActuals::default(), Utc::now()).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[test]
    fn accept_twice_conflicts() {
        let (state, id) = state_with_job();
        accept(&state, id, Utc::now()).unwrap();
        assert!(matches!(
            accept(&state, id, Utc::now()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn bids_only_on_pending_jobs() {
        let (state, id) = state_with_job();
        assert!(matches!(place_bid(&state, id, 0.0), Err(AppError::BadRequest(_))));

        let bid = place_bid(&state, id, 18.0).unwrap();
        assert_eq!(bid.bid_amount, Some(18.0));
        assert_eq!(bid.status, JobStatus::Pending);

        accept(&state, id, Utc::now()).unwrap();
        assert!(matches!(place_bid(&state, id, 18.0), Err(AppError::Conflict(_))));
    }

    #[test]
    fn bid_required_job_needs_a_bid_before_accept() {
        let (state, id) = state_with_job();
        state.jobs.get_mut(&id).unwrap().requires_bid = true;

        assert!(matches!(
            accept(&state, id, Utc::now()),
            Err(AppError::Conflict(_))
        ));

        place_bid(&state, id, 19.0).unwrap();
        let accepted = accept(&state, id, Utc::now()).unwrap();
        assert_eq!(accepted.status, JobStatus::Assigned);
        assert_eq!(accepted.bid_amount, Some(19.0));
    }

    #[test]
    fn cancel_is_allowed_until_completion() {
        let (state, id) = state_with_job();
        accept(&state, id, Utc::now()).unwrap();

        let cancelled = cancel(&state, id, "passenger no-show".to_string()).unwrap();
        assert_eq!(cancelled.status, JobStatus::Cancelled);
        assert_eq!(cancelled.cancel_reason.as_deref(), Some("passenger no-show"));

        assert!(matches!(
            cancel(&state, id, "again".to_string()),
            Err(AppError::Conflict(_))
        ));
    }

    #[test]
    fn unknown_job_is_not_found() {
        let (state, _id) = state_with_job();
        assert!(matches!(
            start(&state, uuid::Uuid::nil()),
            Err(AppError::NotFound(_))
        ));
    }
}
