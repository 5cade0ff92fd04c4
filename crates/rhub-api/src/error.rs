//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use rhub_identity::IdentityError;
use rhub_models::WizardError;
use rhub_storage::StorageError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),

    /// Payload failed schema validation.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Wizard(#[from] WizardError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Firestore error: {0}")]
    Firestore(#[from] rhub_firestore::FirestoreError),

    #[error("Identity provider error: {0}")]
    Identity(#[from] IdentityError),
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) | ApiError::Storage(StorageError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_)
            | ApiError::Storage(StorageError::Duplicate(_))
            | ApiError::Wizard(WizardError::AlreadyCompleted) => StatusCode::CONFLICT,
            ApiError::Wizard(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Identity(IdentityError::InvalidToken(_)) => StatusCode::UNAUTHORIZED,
            ApiError::Identity(e) if e.is_user_facing() => StatusCode::BAD_REQUEST,
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Firestore(_)
            | ApiError::Identity(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound(_) => "not_found",
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Conflict(_) => "conflict",
            ApiError::RateLimited => "rate_limited",
            ApiError::Validation(_) => "validation_error",
            ApiError::Wizard(_) => "registration_error",
            ApiError::Storage(StorageError::NotFound(_)) => "not_found",
            ApiError::Storage(StorageError::Duplicate(_)) => "conflict",
            ApiError::Identity(IdentityError::InvalidToken(_)) => "unauthorized",
            ApiError::Identity(e) if e.is_user_facing() => "verification_failed",
            ApiError::Internal(_)
            | ApiError::Storage(_)
            | ApiError::Firestore(_)
            | ApiError::Identity(_) => "internal_error",
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    message: String,
    code: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Token problems are logged but never echoed back.
        let message = match &self {
            ApiError::Identity(IdentityError::InvalidToken(_)) => "Unauthorized".to_string(),
            ApiError::Identity(e) if e.is_user_facing() => e.to_string(),
            ApiError::Storage(e) if !status.is_server_error() => e.to_string(),
            _ if status.is_server_error() => {
                error!("Request failed: {}", self);
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            message,
            code: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::unauthorized("Unauthorized").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Validation("Title is required".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(StorageError::duplicate("email")).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(WizardError::AlreadyCompleted).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(WizardError::MfaNotStarted).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(IdentityError::from_provider_code("INVALID_CODE")).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(IdentityError::invalid_token("expired")).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(StorageError::Backend("down".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_validation_message_is_body() {
        let err = ApiError::Validation("Title is required".into());
        assert_eq!(err.to_string(), "Title is required");
        assert_eq!(err.code(), "validation_error");
    }
}
