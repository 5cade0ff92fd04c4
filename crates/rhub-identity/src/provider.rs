//! Identity provider trait.

use async_trait::async_trait;

use crate::error::IdentityResult;
use crate::types::{IdentityClaims, IdentityUser};

/// Operations the backend needs from the external identity service.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an ID token and return its claims.
    async fn verify_id_token(&self, id_token: &str) -> IdentityResult<IdentityClaims>;

    /// Look up an account by uid.
    async fn get_user(&self, uid: &str) -> IdentityResult<Option<IdentityUser>>;

    /// Send a verification code to `phone_number` and return the session info
    /// needed to finalize the enrollment.
    async fn start_phone_enrollment(&self, id_token: &str, phone_number: &str) -> IdentityResult<String>;

    /// Confirm the code and enroll the phone as a second factor.
    async fn finalize_phone_enrollment(
        &self,
        id_token: &str,
        session_info: &str,
        code: &str,
    ) -> IdentityResult<()>;

    /// Whether the provider can be reached. Used by readiness checks.
    async fn health_check(&self) -> bool {
        true
    }
}
