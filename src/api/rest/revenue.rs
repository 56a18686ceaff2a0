use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::engine::revenue::{calculate_monthly_revenue_share, RevenueLedger, RevenueShare};
use crate::error::AppError;
use crate::reports::earnings::{self, EarningsSummary};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/revenue/split", post(split))
        .route("/revenue/month", get(month_to_date))
        .route("/analytics/summary", get(analytics_summary))
}

#[derive(Deserialize)]
pub struct SplitRequest {
    pub gross_revenue: f64,
    /// Defaults to the ledger's month-to-date platform share.
    pub app_share_so_far: Option<f64>,
    /// Defaults to the configured threshold.
    pub threshold: Option<f64>,
}

async fn split(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SplitRequest>,
) -> Result<Json<RevenueShare>, AppError> {
    let ledger = state.ledger.lock().await.snapshot(Utc::now());

    let app_share_so_far = payload.app_share_so_far.unwrap_or(ledger.app_share);
    let threshold = payload.threshold.unwrap_or(ledger.threshold);

    for (name, value) in [
        ("gross_revenue", payload.gross_revenue),
        ("app_share_so_far", app_share_so_far),
        ("threshold", threshold),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::BadRequest(format!("{name} must be a non-negative number")));
        }
    }

    Ok(Json(calculate_monthly_revenue_share(
        payload.gross_revenue,
        app_share_so_far,
        threshold,
    )))
}

async fn month_to_date(State(state): State<Arc<AppState>>) -> Json<RevenueLedger> {
    Json(state.ledger.lock().await.snapshot(Utc::now()))
}

async fn analytics_summary(State(state): State<Arc<AppState>>) -> Json<EarningsSummary> {
    let jobs: Vec<_> = state.jobs.iter().map(|e| e.value().clone()).collect();
    let expenses: Vec<_> = state.expenses.iter().map(|e| e.value().clone()).collect();
    let mileage: Vec<_> = state.mileage.iter().map(|e| e.value().clone()).collect();

    Json(earnings::summarize(&jobs, &expenses, &mileage))
}
