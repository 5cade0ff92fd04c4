//! Storage error types.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Duplicate record: {0}")]
    Duplicate(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn duplicate(what: impl Into<String>) -> Self {
        Self::Duplicate(what.into())
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, StorageError::Duplicate(_))
    }
}
