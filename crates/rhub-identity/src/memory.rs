//! In-memory identity provider for development and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use rhub_models::PHONE_NUMBER_RE;

use crate::error::{IdentityError, IdentityResult};
use crate::provider::IdentityProvider;
use crate::types::{EnrolledFactor, IdentityClaims, IdentityUser};

/// The only code this provider accepts when finalizing an enrollment.
pub const VERIFICATION_CODE: &str = "123456";

struct PendingEnrollment {
    uid: String,
    phone_number: String,
}

#[derive(Default)]
struct State {
    users: HashMap<String, IdentityUser>,
    /// token -> uid
    tokens: HashMap<String, String>,
    /// session info -> pending enrollment
    sessions: HashMap<String, PendingEnrollment>,
}

/// Identity provider that keeps accounts in process memory.
///
/// Tokens are opaque strings handed out by [`MemoryIdentityProvider::register`]
/// and [`MemoryIdentityProvider::issue_token`]; no SMS is sent and every
/// enrollment is confirmed with [`VERIFICATION_CODE`].
#[derive(Default)]
pub struct MemoryIdentityProvider {
    state: RwLock<State>,
}

impl MemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) an account and return a fresh ID token for it.
    pub async fn register(
        &self,
        uid: impl Into<String>,
        email: impl Into<String>,
        display_name: Option<String>,
    ) -> String {
        let uid = uid.into();
        let user = IdentityUser {
            uid: uid.clone(),
            email: Some(email.into()),
            display_name,
            enrolled_factors: Vec::new(),
        };
        self.state.write().await.users.insert(uid.clone(), user);
        debug!(uid = %uid, "Registered in-memory identity");
        self.issue_token(&uid).await
    }

    /// Issue another token for an existing uid.
    pub async fn issue_token(&self, uid: &str) -> String {
        let token = Uuid::new_v4().simple().to_string();
        self.state
            .write()
            .await
            .tokens
            .insert(token.clone(), uid.to_string());
        token
    }

    async fn uid_for(&self, id_token: &str) -> IdentityResult<String> {
        let state = self.state.read().await;
        let uid = state
            .tokens
            .get(id_token)
            .ok_or_else(|| IdentityError::invalid_token("INVALID_ID_TOKEN"))?;
        if !state.users.contains_key(uid) {
            return Err(IdentityError::invalid_token("USER_NOT_FOUND"));
        }
        Ok(uid.clone())
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentityProvider {
    async fn verify_id_token(&self, id_token: &str) -> IdentityResult<IdentityClaims> {
        let uid = self.uid_for(id_token).await?;
        let state = self.state.read().await;
        let user = state
            .users
            .get(&uid)
            .ok_or_else(|| IdentityError::invalid_token("USER_NOT_FOUND"))?;
        Ok(IdentityClaims {
            uid,
            email: user.email.clone(),
            email_verified: true,
        })
    }

    async fn get_user(&self, uid: &str) -> IdentityResult<Option<IdentityUser>> {
        Ok(self.state.read().await.users.get(uid).cloned())
    }

    async fn start_phone_enrollment(&self, id_token: &str, phone_number: &str) -> IdentityResult<String> {
        let uid = self.uid_for(id_token).await?;
        if !PHONE_NUMBER_RE.is_match(phone_number) {
            return Err(IdentityError::from_provider_code("INVALID_PHONE_NUMBER"));
        }

        let mut state = self.state.write().await;
        let already_enrolled = state.users.get(&uid).is_some_and(|u| {
            u.enrolled_factors
                .iter()
                .any(|f| f.phone_number.as_deref() == Some(phone_number))
        });
        if already_enrolled {
            return Err(IdentityError::from_provider_code("SECOND_FACTOR_EXISTS"));
        }

        let session_info = Uuid::new_v4().simple().to_string();
        state.sessions.insert(
            session_info.clone(),
            PendingEnrollment {
                uid,
                phone_number: phone_number.to_string(),
            },
        );
        Ok(session_info)
    }

    async fn finalize_phone_enrollment(
        &self,
        id_token: &str,
        session_info: &str,
        code: &str,
    ) -> IdentityResult<()> {
        let uid = self.uid_for(id_token).await?;
        let mut state = self.state.write().await;

        match state.sessions.get(session_info) {
            Some(pending) if pending.uid == uid => {}
            _ => return Err(IdentityError::from_provider_code("INVALID_SESSION_INFO")),
        }
        if code != VERIFICATION_CODE {
            return Err(IdentityError::from_provider_code("INVALID_CODE"));
        }

        let Some(pending) = state.sessions.remove(session_info) else {
            return Err(IdentityError::from_provider_code("INVALID_SESSION_INFO"));
        };
        if let Some(user) = state.users.get_mut(&uid) {
            user.enrolled_factors.push(EnrolledFactor {
                factor_id: "phone".to_string(),
                enrollment_id: Some(Uuid::new_v4().simple().to_string()),
                phone_number: Some(pending.phone_number),
                display_name: Some("Phone".to_string()),
            });
        }
        debug!(uid = %uid, "Enrolled phone factor");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_token_verification() {
        let idp = MemoryIdentityProvider::new();
        let token = idp.register("u1", "a@example.com", None).await;

        let claims = idp.verify_id_token(&token).await.unwrap();
        assert_eq!(claims.uid, "u1");
        assert_eq!(claims.email.as_deref(), Some("a@example.com"));

        assert!(matches!(
            idp.verify_id_token("bogus").await,
            Err(IdentityError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_enrollment_flow() {
        let idp = MemoryIdentityProvider::new();
        let token = idp.register("u1", "a@example.com", None).await;

        let session = idp
            .start_phone_enrollment(&token, "+14155550123")
            .await
            .unwrap();

        let err = idp
            .finalize_phone_enrollment(&token, &session, "000000")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid verification code");

        idp.finalize_phone_enrollment(&token, &session, VERIFICATION_CODE)
            .await
            .unwrap();
        let user = idp.get_user("u1").await.unwrap().unwrap();
        assert!(user.has_mfa());
        assert_eq!(
            user.enrolled_factors[0].phone_number.as_deref(),
            Some("+14155550123")
        );

        // The session is single use.
        let err = idp
            .finalize_phone_enrollment(&token, &session, VERIFICATION_CODE)
            .await
            .unwrap_err();
        assert!(err.is_user_facing());
    }

    #[tokio::test]
    async fn test_invalid_phone_rejected() {
        let idp = MemoryIdentityProvider::new();
        let token = idp.register("u1", "a@example.com", None).await;
        let err = idp.start_phone_enrollment(&token, "555-0123").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid phone number format");
    }

    #[tokio::test]
    async fn test_session_bound_to_account() {
        let idp = MemoryIdentityProvider::new();
        let alice = idp.register("alice", "a@example.com", None).await;
        let bob = idp.register("bob", "b@example.com", None).await;

        let session = idp
            .start_phone_enrollment(&alice, "+14155550123")
            .await
            .unwrap();
        assert!(idp
            .finalize_phone_enrollment(&bob, &session, VERIFICATION_CODE)
            .await
            .is_err());
    }
}
