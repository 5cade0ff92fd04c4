//! Registration wizard handlers.

use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use rhub_models::{RegistrationProgress, StepData, User};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{JsonBody, ValidJson};
use crate::state::AppState;

/// Wizard progress as shown to the client.
#[derive(Debug, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressResponse {
    #[serde(flatten)]
    pub progress: RegistrationProgress,
    /// Name of the current step.
    pub step: &'static str,
    /// A verification code was sent and awaits confirmation.
    pub mfa_pending: bool,
    pub can_complete: bool,
}

impl From<RegistrationProgress> for ProgressResponse {
    fn from(mut progress: RegistrationProgress) -> Self {
        let step = progress.step().as_str();
        let can_complete = progress.can_complete();
        // The provider session handle stays server-side.
        let mfa_pending = progress.mfa_session_info.take().is_some();
        Self {
            progress,
            step,
            mfa_pending,
            can_complete,
        }
    }
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
pub struct VerifyCodeRequest {
    #[validate(length(equal = 6, message = "Enter the 6-digit verification code"))]
    pub code: String,
}

/// Start or resume the wizard.
pub async fn get_progress(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProgressResponse>> {
    Ok(Json(state.wizard.start(&user).await?.into()))
}

/// Submit the current step's data.
pub async fn submit_step(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(data): JsonBody<StepData>,
) -> ApiResult<Json<ProgressResponse>> {
    Ok(Json(state.wizard.submit(&user.uid, data).await?.into()))
}

pub async fn go_back(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProgressResponse>> {
    Ok(Json(state.wizard.back(&user.uid).await?.into()))
}

/// Send a verification code to the phone from the security step.
pub async fn start_mfa(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ProgressResponse>> {
    Ok(Json(state.wizard.start_mfa(&user).await?.into()))
}

pub async fn verify_mfa(
    State(state): State<AppState>,
    user: AuthUser,
    ValidJson(request): ValidJson<VerifyCodeRequest>,
) -> ApiResult<Json<ProgressResponse>> {
    Ok(Json(state.wizard.verify_mfa(&user, &request.code).await?.into()))
}

/// Create the account from the wizard and sign it in.
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<User>)> {
    let account = state.wizard.complete(&user.uid).await?;
    let jar = state.sessions.login(jar, account.id).await?;
    Ok((jar, Json(account)))
}
