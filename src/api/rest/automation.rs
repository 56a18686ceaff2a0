use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::engine::automation::{apply_decision, process_batch};
use crate::engine::planning::{automation_patch, suggest_preferences};
use crate::engine::scoring::Uno;
use crate::error::AppError;
use crate::models::decision::{Decision, DecisionSummary};
use crate::models::job::Job;
use crate::models::preferences::{AutomationPreferences, PreferencesPatch, Zone};
use crate::models::profile::{DriverProfile, PlanInputs};
use crate::state::AppState;
use crate::storage::{save_json, PREFERENCES_KEY};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/automation/preferences",
            get(get_preferences).patch(update_preferences),
        )
        .route("/automation/zones/:id/toggle", post(toggle_zone))
        .route("/automation/batch", post(run_batch))
        .route("/automation/suggestions", post(suggest))
}

#[derive(Deserialize)]
pub struct BatchRequest {
    pub job_ids: Vec<Uuid>,
}

#[derive(Serialize)]
pub struct BatchResponse {
    pub decisions: Vec<Decision>,
    pub summary: DecisionSummary,
}

#[derive(Deserialize)]
pub struct SuggestionRequest {
    /// Defaults to the stock profile.
    #[serde(default)]
    pub personal: Option<DriverProfile>,
    #[serde(flatten)]
    pub inputs: PlanInputs,
    /// Also push the suggested payout floor and hour cap into Uno.
    #[serde(default)]
    pub apply: bool,
}

async fn get_preferences(State(state): State<Arc<AppState>>) -> Json<AutomationPreferences> {
    Json(state.uno.read().await.preferences().clone())
}

async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<PreferencesPatch>,
) -> Result<Json<AutomationPreferences>, AppError> {
    Ok(Json(patch_preferences(&state, patch).await?))
}

async fn patch_preferences(
    state: &AppState,
    patch: PreferencesPatch,
) -> Result<AutomationPreferences, AppError> {
    let mut uno = state.uno.write().await;

    let mut updated = uno.preferences().clone();
    updated.apply(patch);
    updated.validate().map_err(AppError::BadRequest)?;

    save_json(state.store.as_ref(), PREFERENCES_KEY, &updated)?;
    uno.update_preferences(updated.clone());

    info!(
        enabled = updated.enabled,
        auto_accept = updated.auto_accept,
        auto_bid = updated.auto_bid,
        "automation preferences updated"
    );
    Ok(updated)
}

async fn suggest(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SuggestionRequest>,
) -> Result<Json<DriverProfile>, AppError> {
    let personal = payload.personal.unwrap_or_default();
    let plan = suggest_preferences(&personal, &payload.inputs)?;

    if payload.apply {
        patch_preferences(&state, automation_patch(&plan)).await?;
    }

    info!(
        strategy = ?plan.strategy_mode,
        target_hourly_rate = plan.target_hourly_rate,
        applied = payload.apply,
        "preference suggestion generated"
    );
    Ok(Json(plan))
}

async fn toggle_zone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Zone>, AppError> {
    let mut uno = state.uno.write().await;

    let mut updated = uno.preferences().clone();
    let zone = updated
        .toggle_zone(&id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("zone {} not found", id)))?;

    save_json(state.store.as_ref(), PREFERENCES_KEY, &updated)?;
    uno.update_preferences(updated);

    Ok(Json(zone))
}

async fn run_batch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, AppError> {
    let jobs = payload
        .job_ids
        .iter()
        .map(|id| {
            state
                .jobs
                .get(id)
                .map(|entry| entry.value().clone())
                .ok_or_else(|| AppError::NotFound(format!("job {} not found", id)))
        })
        .collect::<Result<Vec<Job>, AppError>>()?;

    let uno = state.uno.read().await.clone();
    let decisions = process_batch(&uno, &jobs, Utc::now(), state.batch_pacing, |job, decision| {
        apply_decision(&state, job, decision)
    })
    .await;

    let summary = Uno::summarize(&decisions);
    info!(
        accepted = summary.accepted,
        bid = summary.bid,
        declined = summary.declined,
        "batch processed"
    );

    Ok(Json(BatchResponse { decisions, summary }))
}
