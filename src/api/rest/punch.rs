use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use crate::error::AppError;
use crate::models::session::PunchSession;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/punch/in", post(punch_in))
        .route("/punch/out", post(punch_out))
        .route("/punch/current", get(current_session))
        .route("/punch/sessions", get(list_sessions))
}

#[derive(Deserialize)]
pub struct PunchInRequest {
    pub start_odometer: f64,
}

#[derive(Deserialize)]
pub struct PunchOutRequest {
    pub end_odometer: f64,
}

async fn punch_in(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PunchInRequest>,
) -> Result<Json<PunchSession>, AppError> {
    let mut clock = state.punch.lock().await;
    let session = clock.punch_in(payload.start_odometer, Utc::now(), state.store.as_ref())?;

    info!(session_id = %session.id, odometer = session.start_odometer, "punched in");
    Ok(Json(session))
}

async fn punch_out(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PunchOutRequest>,
) -> Result<Json<PunchSession>, AppError> {
    let mut clock = state.punch.lock().await;
    let session = clock.punch_out(payload.end_odometer, Utc::now(), state.store.as_ref())?;

    info!(
        session_id = %session.id,
        miles = session.total_miles,
        duration_secs = session.total_duration_secs,
        "punched out"
    );
    Ok(Json(session))
}

async fn current_session(State(state): State<Arc<AppState>>) -> Json<Option<PunchSession>> {
    Json(state.punch.lock().await.current.clone())
}

async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<PunchSession>> {
    Json(state.punch.lock().await.sessions.clone())
}
