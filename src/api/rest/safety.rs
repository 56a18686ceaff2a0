use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::engine::safety::safety_status;
use crate::error::AppError;
use crate::models::safety::{DutyHours, SafetySettings, SafetySettingsPatch, SafetyStatus};
use crate::state::AppState;
use crate::storage::{save_json, SAFETY_SETTINGS_KEY};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/safety/settings",
            get(get_settings).patch(update_settings),
        )
        .route("/safety/status", get(status))
}

#[derive(Serialize)]
pub struct SafetyReport {
    pub hours: DutyHours,
    pub status: SafetyStatus,
}

async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SafetySettings> {
    Json(state.safety.read().await.clone())
}

async fn update_settings(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<SafetySettingsPatch>,
) -> Result<Json<SafetySettings>, AppError> {
    let mut settings = state.safety.write().await;

    let mut updated = settings.clone();
    updated.apply(patch);
    updated.validate().map_err(AppError::BadRequest)?;

    save_json(state.store.as_ref(), SAFETY_SETTINGS_KEY, &updated)?;
    *settings = updated.clone();

    info!(
        block_when_over_hours = updated.allow_ai_to_block_jobs_when_over_hours,
        "safety settings updated"
    );
    Ok(Json(updated))
}

async fn status(State(state): State<Arc<AppState>>) -> Json<SafetyReport> {
    let hours = state.duty_hours(Utc::now()).await;
    let settings = state.safety.read().await;
    Json(SafetyReport {
        hours,
        status: safety_status(&settings, &hours),
    })
}
