//! Application handlers.

use axum::extract::State;
use axum::Json;
use tracing::info;

use rhub_models::{Application, ApplicationWithJob, NewApplication};

use crate::error::ApiResult;
use crate::extract::{validate_payload, JsonBody};
use crate::session::SessionUser;
use crate::state::AppState;

/// The candidate's applications, each with its job when it still exists.
pub async fn list_applications(
    State(state): State<AppState>,
    session: SessionUser,
) -> ApiResult<Json<Vec<ApplicationWithJob>>> {
    let applications = state
        .storage
        .get_applications_by_candidate(session.user_id)
        .await?;

    let mut joined = Vec::with_capacity(applications.len());
    for application in applications {
        let job = state.storage.get_job(application.job_id).await?;
        joined.push(ApplicationWithJob { application, job });
    }
    Ok(Json(joined))
}

/// Apply to a job as the signed-in user. Applications start as pending.
pub async fn create_application(
    State(state): State<AppState>,
    session: SessionUser,
    JsonBody(mut new_application): JsonBody<NewApplication>,
) -> ApiResult<Json<Application>> {
    new_application.candidate_id = session.user_id;
    validate_payload(&new_application)?;

    let application = state.storage.create_application(new_application).await?;
    info!(
        application_id = application.id,
        job_id = application.job_id,
        candidate_id = application.candidate_id,
        "Application submitted"
    );
    Ok(Json(application))
}
