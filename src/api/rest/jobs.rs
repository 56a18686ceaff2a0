use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::lifecycle::{self, TripActuals};
use crate::engine::queue::submit_offer;
use crate::error::AppError;
use crate::geo::haversine_miles;
use crate::models::decision::Decision;
use crate::models::job::{GeoLocation, Job, JobStatus};
use crate::state::AppState;

const SHARE_TOLERANCE: f64 = 0.01;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/jobs", post(create_job))
        .route("/jobs/available", get(list_available))
        .route("/jobs/mine", get(list_mine))
        .route("/jobs/:id", get(get_job))
        .route("/jobs/:id/evaluation", get(evaluate_job))
        .route("/jobs/:id/accept", post(accept_job))
        .route("/jobs/:id/bid", post(bid_job))
        .route("/jobs/:id/start", post(start_job))
        .route("/jobs/:id/complete", post(complete_job))
        .route("/jobs/:id/cancel", post(cancel_job))
        .route("/decisions", get(list_decisions))
}

#[derive(Deserialize)]
pub struct CreateJobRequest {
    pub pickup: GeoLocation,
    pub dropoff: GeoLocation,
    pub pickup_time: DateTime<FixedOffset>,
    pub gross_fare: f64,
    pub app_share: f64,
    pub driver_share: f64,
    /// Miles; straight-line pickup to dropoff when omitted.
    pub distance: Option<f64>,
    #[serde(default)]
    pub duration: f64,
    pub passenger_name: Option<String>,
    pub notes: Option<String>,
    pub zone: Option<String>,
    #[serde(default)]
    pub requires_bid: bool,
    /// Backdates the listing; defaults to now.
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
pub struct AvailableQuery {
    pub max_distance: Option<f64>,
    pub min_payout: Option<f64>,
}

#[derive(Deserialize)]
pub struct MineQuery {
    pub status: Option<JobStatus>,
}

#[derive(Deserialize)]
pub struct BidRequest {
    pub amount: f64,
}

#[derive(Deserialize, Default)]
pub struct CompleteRequest {
    pub actual_distance: Option<f64>,
    pub actual_duration: Option<f64>,
}

#[derive(Deserialize)]
pub struct CancelRequest {
    pub reason: String,
}

fn validate_offer(payload: &CreateJobRequest) -> Result<(), AppError> {
    let amounts = [payload.gross_fare, payload.app_share, payload.driver_share, payload.duration];
    if amounts.iter().any(|v| !v.is_finite() || *v < 0.0) {
        return Err(AppError::BadRequest(
            "fares, shares and duration must be non-negative numbers".to_string(),
        ));
    }

    if (payload.app_share + payload.driver_share - payload.gross_fare).abs() > SHARE_TOLERANCE {
        return Err(AppError::BadRequest(format!(
            "app_share ({}) + driver_share ({}) must equal gross_fare ({})",
            payload.app_share, payload.driver_share, payload.gross_fare
        )));
    }

    if let Some(distance) = payload.distance {
        if !distance.is_finite() || distance < 0.0 {
            return Err(AppError::BadRequest("distance must be >= 0".to_string()));
        }
    }

    if payload.pickup.address.trim().is_empty() {
        return Err(AppError::BadRequest("pickup address cannot be empty".to_string()));
    }

    Ok(())
}

async fn create_job(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateJobRequest>,
) -> Result<Json<Job>, AppError> {
    validate_offer(&payload)?;

    let distance = payload
        .distance
        .unwrap_or_else(|| haversine_miles(&payload.pickup, &payload.dropoff));

    let job = Job {
        id: Uuid::new_v4(),
        pickup: payload.pickup,
        dropoff: payload.dropoff,
        pickup_time: payload.pickup_time,
        status: JobStatus::Pending,
        gross_fare: payload.gross_fare,
        app_share: payload.app_share,
        driver_share: payload.driver_share,
        distance,
        duration: payload.duration,
        passenger_name: payload.passenger_name,
        notes: payload.notes,
        zone: payload.zone,
        requires_bid: payload.requires_bid,
        bid_amount: None,
        created_at: payload.created_at.unwrap_or_else(Utc::now),
        accepted_at: None,
        completed_at: None,
        cancel_reason: None,
    };

    Ok(Json(submit_offer(&state, job).await?))
}

fn sorted_by_pickup(mut jobs: Vec<Job>) -> Vec<Job> {
    jobs.sort_by_key(|job| job.pickup_time);
    jobs
}

async fn list_available(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AvailableQuery>,
) -> Json<Vec<Job>> {
    let jobs = state
        .jobs
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|job| job.status == JobStatus::Pending)
        .filter(|job| query.max_distance.is_none_or(|max| job.distance <= max))
        .filter(|job| query.min_payout.is_none_or(|min| job.driver_share >= min))
        .collect();

    Json(sorted_by_pickup(jobs))
}

async fn list_mine(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MineQuery>,
) -> Json<Vec<Job>> {
    let jobs = state
        .jobs
        .iter()
        .map(|entry| entry.value().clone())
        .filter(|job| job.status != JobStatus::Pending)
        .filter(|job| query.status.is_none_or(|status| job.status == status))
        .collect();

    Json(sorted_by_pickup(jobs))
}

fn find_job(state: &AppState, id: Uuid) -> Result<Job, AppError> {
    state
        .jobs
        .get(&id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("job {} not found", id)))
}

async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(find_job(&state, id)?))
}

async fn evaluate_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Decision>, AppError> {
    let job = find_job(&state, id)?;
    let decision = state.uno.read().await.evaluate(&job, Utc::now());
    Ok(Json(decision))
}

async fn accept_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(lifecycle::accept(&state, id, Utc::now())?))
}

async fn bid_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BidRequest>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(lifecycle::place_bid(&state, id, payload.amount)?))
}

async fn start_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Job>, AppError> {
    Ok(Json(lifecycle::start(&state, id)?))
}

async fn complete_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<Job>, AppError> {
    // An empty body completes with the quoted distance and duration.
    let payload: CompleteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CompleteRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| AppError::BadRequest(format!("invalid completion body: {err}")))?
    };
    let actuals = TripActuals {
        distance: payload.actual_distance,
        duration: payload.actual_duration,
    };
    Ok(Json(lifecycle::complete(&state, id, actuals, Utc::now()).await?))
}

async fn cancel_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CancelRequest>,
) -> Result<Json<Job>, AppError> {
    if payload.reason.trim().is_empty() {
        return Err(AppError::BadRequest("reason cannot be empty".to_string()));
    }
    Ok(Json(lifecycle::cancel(&state, id, payload.reason)?))
}

async fn list_decisions(State(state): State<Arc<AppState>>) -> Json<Vec<Decision>> {
    let mut decisions: Vec<Decision> = state
        .decisions
        .iter()
        .map(|entry| entry.value().clone())
        .collect();
    decisions.sort_by_key(|d| d.evaluated_at);
    Json(decisions)
}
