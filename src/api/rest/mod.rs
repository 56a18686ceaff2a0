pub mod automation;
pub mod expenses;
pub mod jobs;
pub mod punch;
pub mod revenue;
pub mod safety;
pub mod ws;

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Serialize;
use tower_http::cors::CorsLayer;

use crate::models::job::JobStatus;
use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(jobs::router())
        .merge(automation::router())
        .merge(revenue::router())
        .merge(expenses::router())
        .merge(punch::router())
        .merge(safety::router())
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    available_jobs: usize,
    jobs: usize,
    decisions: usize,
    expenses: usize,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let available_jobs = state
        .jobs
        .iter()
        .filter(|entry| entry.value().status == JobStatus::Pending)
        .count();

    Json(HealthResponse {
        status: "ok",
        available_jobs,
        jobs: state.jobs.len(),
        decisions: state.decisions.len(),
        expenses: state.expenses.len(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(err) => (StatusCode::INTERNAL_SERVER_ERROR, err).into_response(),
    }
}
