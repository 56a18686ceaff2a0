use tracing::{debug, error};

use crate::error::AppError;
use crate::models::job::Job;
use crate::state::AppState;

/// Stores a new offer and hands it to the automation worker.
///
/// The job is visible in `state.jobs` before the worker sees it, so an
/// automated accept always finds it. If the worker queue is closed the
/// offer is withdrawn again and nothing is left behind.
pub async fn submit_offer(state: &AppState, job: Job) -> Result<Job, AppError> {
    let id = job.id;
    state.jobs.insert(id, job.clone());

    if state.job_tx.send(job.clone()).await.is_err() {
        state.jobs.remove(&id);
        error!(job_id = %id, "automation queue closed; offer withdrawn");
        return Err(AppError::Internal(
            "automation queue is not accepting offers".to_string(),
        ));
    }

    state.metrics.jobs_in_queue.inc();
    debug!(job_id = %id, queued = state.metrics.jobs_in_queue.get(), "offer queued");
    Ok(job)
}
