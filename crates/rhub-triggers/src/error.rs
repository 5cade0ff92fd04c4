//! Trigger error types.

use thiserror::Error;

pub type TriggerResult<T> = Result<T, TriggerError>;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Invalid event payload: {0}")]
    InvalidPayload(String),

    #[error("Event bus closed")]
    BusClosed,

    #[error("Firestore error: {0}")]
    Firestore(#[from] rhub_firestore::FirestoreError),

    #[error("Identity error: {0}")]
    Identity(#[from] rhub_identity::IdentityError),
}

impl TriggerError {
    pub fn invalid_payload(msg: impl Into<String>) -> Self {
        Self::InvalidPayload(msg.into())
    }
}
