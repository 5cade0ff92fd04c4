//! Company handlers.

use axum::extract::{Path, State};
use axum::Json;

use rhub_models::{Company, NewCompany};

use crate::error::{ApiError, ApiResult};
use crate::extract::{validate_payload, JsonBody};
use crate::session::SessionUser;
use crate::state::AppState;

/// Create the signed-in user's company. A user owns at most one.
pub async fn create_company(
    State(state): State<AppState>,
    session: SessionUser,
    JsonBody(mut new_company): JsonBody<NewCompany>,
) -> ApiResult<Json<Company>> {
    new_company.user_id = session.user_id;
    validate_payload(&new_company)?;

    if state
        .storage
        .get_company_by_user_id(session.user_id)
        .await?
        .is_some()
    {
        return Err(ApiError::conflict("Company already exists"));
    }

    Ok(Json(state.storage.create_company(new_company).await?))
}

pub async fn my_company(
    State(state): State<AppState>,
    session: SessionUser,
) -> ApiResult<Json<Company>> {
    state
        .storage
        .get_company_by_user_id(session.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Company not found"))
}

pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> ApiResult<Json<Company>> {
    state
        .storage
        .get_company(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Company not found"))
}
