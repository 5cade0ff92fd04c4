//! Identity provider error types.

use thiserror::Error;

pub type IdentityResult<T> = Result<T, IdentityError>;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("Invalid ID token: {0}")]
    InvalidToken(String),

    /// Rejection the end user can act on, e.g. a wrong verification code.
    #[error("{0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl IdentityError {
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Map an Identity Toolkit error code to an error.
    ///
    /// Codes look like `INVALID_CODE` or `TOO_MANY_ATTEMPTS_TRY_LATER : detail`.
    pub fn from_provider_code(code: &str) -> Self {
        let key = code.split([' ', ':']).next().unwrap_or(code);
        match key {
            "INVALID_ID_TOKEN" | "TOKEN_EXPIRED" | "USER_NOT_FOUND" | "USER_DISABLED" => {
                Self::InvalidToken(key.to_string())
            }
            "INVALID_CODE" => Self::rejected("Invalid verification code"),
            "SESSION_EXPIRED" | "INVALID_SESSION_INFO" => {
                Self::rejected("Verification session expired, request a new code")
            }
            "INVALID_PHONE_NUMBER" => Self::rejected("Invalid phone number format"),
            "TOO_MANY_ATTEMPTS_TRY_LATER" | "QUOTA_EXCEEDED" => {
                Self::rejected("Too many attempts, try again later")
            }
            "SECOND_FACTOR_EXISTS" => Self::rejected("This phone number is already enrolled"),
            "UNVERIFIED_EMAIL" => Self::rejected("Verify your email address before enabling MFA"),
            _ => Self::RequestFailed(code.to_string()),
        }
    }

    /// True when the message is safe and useful to show to the end user.
    pub fn is_user_facing(&self) -> bool {
        matches!(self, IdentityError::Rejected(_))
    }
}
