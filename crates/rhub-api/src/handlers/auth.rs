//! Account and session handlers.

use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

use rhub_identity::IdentityUser;
use rhub_models::{NewUser, User};
use rhub_triggers::TriggerEvent;

use crate::error::{ApiError, ApiResult};
use crate::extract::ValidJson;
use crate::session::SessionUser;
use crate::state::AppState;

/// Current user.
pub async fn me(State(state): State<AppState>, session: SessionUser) -> ApiResult<Json<User>> {
    let user = state
        .storage
        .get_user(session.user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;
    Ok(Json(user))
}

/// Create an account and sign it in.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(new_user): ValidJson<NewUser>,
) -> ApiResult<(CookieJar, Json<User>)> {
    let user = state.storage.create_user(new_user).await?;
    let jar = state.sessions.login(jar, user.id).await?;
    info!(user_id = user.id, role = user.role.as_str(), "User registered");

    let account = IdentityUser {
        uid: user.id.to_string(),
        email: Some(user.email.clone()),
        display_name: Some(user.display_name()),
        enrolled_factors: Vec::new(),
    };
    if let Err(e) = state.events.publish(TriggerEvent::UserCreated(account)) {
        warn!(user_id = user.id, "Failed to publish user-created event: {}", e);
    }

    Ok((jar, Json(user)))
}

#[derive(Debug, Deserialize, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionRequest {
    #[validate(length(min = 1, message = "ID token is required"))]
    pub id_token: String,
}

/// Exchange an identity-provider ID token for a session.
pub async fn create_session(
    State(state): State<AppState>,
    jar: CookieJar,
    ValidJson(request): ValidJson<SessionRequest>,
) -> ApiResult<(CookieJar, Json<User>)> {
    let claims = state.identity.verify_id_token(&request.id_token).await?;
    let user = state
        .storage
        .get_user_by_firebase_uid(&claims.uid)
        .await?
        .ok_or_else(|| ApiError::not_found("No account for this identity, finish registration first"))?;

    let jar = state.sessions.login(jar, user.id).await?;
    Ok((jar, Json(user)))
}

/// Drop the session and its cookie.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<serde_json::Value>) {
    let jar = state.sessions.logout(jar).await;
    (jar, Json(serde_json::json!({ "success": true })))
}
