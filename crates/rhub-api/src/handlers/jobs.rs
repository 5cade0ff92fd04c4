//! Job handlers.

use axum::extract::{Path, State};
use axum::Json;
use tracing::info;

use rhub_models::{Job, NewJob};

use crate::error::{ApiError, ApiResult};
use crate::extract::{validate_payload, JsonBody};
use crate::session::SessionUser;
use crate::state::AppState;

/// All jobs, oldest first.
pub async fn list_jobs(State(state): State<AppState>) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.storage.get_jobs().await?))
}

/// Jobs posted by the signed-in employer.
pub async fn posted_jobs(
    State(state): State<AppState>,
    session: SessionUser,
) -> ApiResult<Json<Vec<Job>>> {
    Ok(Json(state.storage.get_jobs_by_employer(session.user_id).await?))
}

pub async fn get_job(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<Job>> {
    state
        .storage
        .get_job(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Job not found"))
}

/// Post a job as the signed-in user. New jobs start as drafts.
pub async fn create_job(
    State(state): State<AppState>,
    session: SessionUser,
    JsonBody(mut new_job): JsonBody<NewJob>,
) -> ApiResult<Json<Job>> {
    new_job.employer_id = session.user_id;
    validate_payload(&new_job)?;

    let job = state.storage.create_job(new_job).await?;
    info!(job_id = job.id, employer_id = job.employer_id, "Job created");
    Ok(Json(job))
}
