//! Document store error types.

use thiserror::Error;

/// Result type for document store operations.
pub type FirestoreResult<T> = Result<T, FirestoreError>;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum FirestoreError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    AlreadyExists(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Server error ({0}): {1}")]
    ServerError(u16, String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FirestoreError {
    pub fn auth_error(msg: impl Into<String>) -> Self {
        Self::AuthError(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn not_found(path: impl Into<String>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn request_failed(msg: impl Into<String>) -> Self {
        Self::RequestFailed(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::SerializationError(msg.into())
    }

    /// Map a non-success HTTP status to an error.
    pub fn from_http_status(status: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match status {
            401 => Self::AuthError(msg),
            403 => Self::PermissionDenied(msg),
            404 => Self::NotFound(msg),
            409 => Self::AlreadyExists(msg),
            429 => Self::RateLimited,
            500..=599 => Self::ServerError(status, msg),
            _ => Self::RequestFailed(msg),
        }
    }

    /// HTTP status this error corresponds to, when known.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            FirestoreError::AuthError(_) => Some(401),
            FirestoreError::PermissionDenied(_) => Some(403),
            FirestoreError::NotFound(_) => Some(404),
            FirestoreError::AlreadyExists(_) => Some(409),
            FirestoreError::RateLimited => Some(429),
            FirestoreError::ServerError(code, _) => Some(*code),
            FirestoreError::RequestFailed(_) => Some(400),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        assert!(matches!(
            FirestoreError::from_http_status(404, "missing"),
            FirestoreError::NotFound(_)
        ));
        assert!(matches!(
            FirestoreError::from_http_status(409, "exists"),
            FirestoreError::AlreadyExists(_)
        ));
        assert!(matches!(
            FirestoreError::from_http_status(429, "slow down"),
            FirestoreError::RateLimited
        ));
        assert!(matches!(
            FirestoreError::from_http_status(503, "unavailable"),
            FirestoreError::ServerError(503, _)
        ));
        assert!(matches!(
            FirestoreError::from_http_status(400, "bad"),
            FirestoreError::RequestFailed(_)
        ));
    }

    #[test]
    fn test_http_status_getter() {
        assert_eq!(FirestoreError::RateLimited.http_status(), Some(429));
        assert_eq!(
            FirestoreError::ServerError(502, "bad gateway".into()).http_status(),
            Some(502)
        );
        assert_eq!(FirestoreError::config("x").http_status(), None);
    }
}
