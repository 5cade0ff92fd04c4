//! Identity-provider ID token authentication.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::ApiError;
use crate::state::AppState;

/// Caller authenticated with an identity-provider ID token.
///
/// Used by the registration wizard, which runs before a local account
/// (and therefore a session) exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
    /// The bearer token, forwarded to provider calls made for this user.
    pub id_token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::unauthorized("Missing Authorization header"))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| ApiError::unauthorized("Invalid Authorization header format"))?;

        let claims = state.identity.verify_id_token(token).await?;

        Ok(AuthUser {
            uid: claims.uid,
            email: claims.email,
            email_verified: claims.email_verified,
            id_token: token.to_string(),
        })
    }
}
