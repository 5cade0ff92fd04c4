//! Registration wizard service.
//!
//! Loads progress from the document store, applies one state-machine
//! transition, calls the identity provider where a step needs it and
//! saves the result. Every saved write of `registrationProgress/{uid}` is
//! seen by the registration-complete trigger.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use rhub_firestore::{DocumentStore, ProgressRepository};
use rhub_identity::{IdentityProvider, IdentityUser};
use rhub_models::{RegistrationProgress, StepData, User, WizardError, WizardStep};
use rhub_storage::Storage;
use rhub_triggers::{EventBus, TriggerEvent};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::metrics;

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub struct WizardService {
    progress: ProgressRepository,
    storage: Arc<dyn Storage>,
    identity: Arc<dyn IdentityProvider>,
    events: EventBus,
}

impl WizardService {
    pub fn new(
        documents: Arc<dyn DocumentStore>,
        storage: Arc<dyn Storage>,
        identity: Arc<dyn IdentityProvider>,
        events: EventBus,
    ) -> Self {
        Self {
            progress: ProgressRepository::new(documents),
            storage,
            identity,
            events,
        }
    }

    fn publish(&self, event: TriggerEvent) {
        if let Err(e) = self.events.publish(event) {
            warn!("Failed to publish trigger event: {}", e);
        }
    }

    /// Saved progress for `uid`; 404 when the wizard was never started.
    pub async fn load(&self, uid: &str) -> ApiResult<RegistrationProgress> {
        self.progress
            .get(uid)
            .await?
            .ok_or_else(|| ApiError::not_found("Registration not started"))
    }

    /// Resume saved progress, or start at the first step.
    ///
    /// Starting fresh is the first time the backend sees this identity,
    /// so it also raises the user-created trigger. An identity that already
    /// owns an account cannot start over once its progress is cleaned up.
    pub async fn start(&self, user: &AuthUser) -> ApiResult<RegistrationProgress> {
        if let Some(progress) = self.progress.get(&user.uid).await? {
            return Ok(progress);
        }
        if self.storage.get_user_by_firebase_uid(&user.uid).await?.is_some() {
            return Err(WizardError::AlreadyCompleted.into());
        }

        let progress = RegistrationProgress::new(&user.uid, user.email.clone(), now_ms());
        self.progress.save(&progress).await?;
        info!(uid = %user.uid, "Registration started");

        let account = match self.identity.get_user(&user.uid).await {
            Ok(Some(account)) => account,
            Ok(None) => IdentityUser {
                uid: user.uid.clone(),
                email: user.email.clone(),
                ..Default::default()
            },
            Err(e) => {
                warn!(uid = %user.uid, "Identity lookup failed: {}", e);
                IdentityUser {
                    uid: user.uid.clone(),
                    email: user.email.clone(),
                    ..Default::default()
                }
            }
        };
        self.publish(TriggerEvent::UserCreated(account));

        Ok(progress)
    }

    pub async fn submit(&self, uid: &str, data: StepData) -> ApiResult<RegistrationProgress> {
        let mut progress = self.load(uid).await?;
        let next = progress.submit(data, now_ms())?;
        self.progress.save(&progress).await?;
        metrics::record_wizard_transition("submit", next.as_str());
        Ok(progress)
    }

    pub async fn back(&self, uid: &str) -> ApiResult<RegistrationProgress> {
        let mut progress = self.load(uid).await?;
        let previous = progress.back(now_ms())?;
        self.progress.save(&progress).await?;
        metrics::record_wizard_transition("back", previous.as_str());
        Ok(progress)
    }

    /// Send a verification code to the phone number given in the security step.
    pub async fn start_mfa(&self, user: &AuthUser) -> ApiResult<RegistrationProgress> {
        let mut progress = self.load(&user.uid).await?;
        if progress.completed {
            return Err(WizardError::AlreadyCompleted.into());
        }
        if progress.step() != WizardStep::Mfa {
            return Err(WizardError::MfaNotExpected(progress.step()).into());
        }
        let phone_number = progress
            .security
            .as_ref()
            .and_then(|s| s.phone_number.clone())
            .ok_or_else(|| ApiError::Validation("Phone number is required for MFA".to_string()))?;

        let session_info = self
            .identity
            .start_phone_enrollment(&user.id_token, &phone_number)
            .await?;

        progress.begin_mfa(session_info, now_ms())?;
        self.progress.save(&progress).await?;
        info!(uid = %user.uid, "Verification code sent");
        Ok(progress)
    }

    /// Finalize the enrollment with the code the user received.
    pub async fn verify_mfa(&self, user: &AuthUser, code: &str) -> ApiResult<RegistrationProgress> {
        let mut progress = self.load(&user.uid).await?;
        let session_info = progress.pending_mfa_session()?.to_string();

        let before = self.account_snapshot(&user.uid).await;
        self.identity
            .finalize_phone_enrollment(&user.id_token, &session_info, code)
            .await?;

        // The provider has consumed the session; record that before anything
        // else can fail.
        let next = progress.confirm_mfa(now_ms())?;
        self.progress.save(&progress).await?;
        metrics::record_wizard_transition("mfa", next.as_str());

        let after = self.account_snapshot(&user.uid).await;
        if let (Some(before), Some(after)) = (before, after) {
            self.publish(TriggerEvent::IdentityUpdated { before, after });
        }
        Ok(progress)
    }

    /// Provider view of an account for trigger events. Lookup failures only
    /// drop the event.
    async fn account_snapshot(&self, uid: &str) -> Option<IdentityUser> {
        match self.identity.get_user(uid).await {
            Ok(account) => account,
            Err(e) => {
                warn!(uid = %uid, "Identity lookup failed: {}", e);
                None
            }
        }
    }

    /// Create the account (and employer company) and close the wizard.
    pub async fn complete(&self, uid: &str) -> ApiResult<User> {
        let mut progress = self.load(uid).await?;
        let (new_user, new_company) = progress.prepare_completion()?;

        if self.storage.get_user_by_firebase_uid(uid).await?.is_some() {
            return Err(ApiError::conflict("An account already exists for this identity"));
        }

        let user = self.storage.create_user(new_user).await?;
        if let Some(mut company) = new_company {
            company.user_id = user.id;
            self.storage.create_company(company).await?;
        }

        progress.mark_completed(now_ms())?;
        self.progress.save(&progress).await?;

        metrics::record_registration_completed(user.role.as_str());
        info!(uid = %uid, user_id = user.id, "Registration completed");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use tokio::sync::mpsc::UnboundedReceiver;

    use rhub_firestore::MemoryDocumentStore;
    use rhub_identity::memory::VERIFICATION_CODE;
    use rhub_identity::{IdentityClaims, IdentityError, IdentityResult, MemoryIdentityProvider};
    use rhub_models::{CommunicationPreference, CompanyStep, ProfileStep, Role, SecurityStep};
    use rhub_storage::MemStorage;

    /// Memory provider whose account lookups fail once an enrollment is finalized.
    struct LookupOutageAfterEnroll {
        inner: MemoryIdentityProvider,
        enrolled: AtomicBool,
    }

    #[axum::async_trait]
    impl IdentityProvider for LookupOutageAfterEnroll {
        async fn verify_id_token(&self, id_token: &str) -> IdentityResult<IdentityClaims> {
            self.inner.verify_id_token(id_token).await
        }

        async fn get_user(&self, uid: &str) -> IdentityResult<Option<IdentityUser>> {
            if self.enrolled.load(Ordering::SeqCst) {
                return Err(IdentityError::from_provider_code("INTERNAL_ERROR"));
            }
            self.inner.get_user(uid).await
        }

        async fn start_phone_enrollment(&self, id_token: &str, phone_number: &str) -> IdentityResult<String> {
            self.inner.start_phone_enrollment(id_token, phone_number).await
        }

        async fn finalize_phone_enrollment(
            &self,
            id_token: &str,
            session_info: &str,
            code: &str,
        ) -> IdentityResult<()> {
            self.inner
                .finalize_phone_enrollment(id_token, session_info, code)
                .await?;
            self.enrolled.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn service(
        identity: Arc<dyn IdentityProvider>,
    ) -> (WizardService, Arc<dyn DocumentStore>, UnboundedReceiver<TriggerEvent>) {
        let documents: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let (events, receiver) = EventBus::new();
        let wizard = WizardService::new(
            Arc::clone(&documents),
            Arc::new(MemStorage::new()),
            identity,
            events,
        );
        (wizard, documents, receiver)
    }

    fn auth(uid: &str, token: String) -> AuthUser {
        AuthUser {
            uid: uid.to_string(),
            email: Some(format!("{}@example.com", uid)),
            email_verified: true,
            id_token: token,
        }
    }

    async fn fill_steps(wizard: &WizardService, user: &AuthUser, enable_mfa: bool) {
        wizard.start(user).await.unwrap();
        let steps = [
            StepData::Profile(ProfileStep {
                first_name: "Cy".to_string(),
                last_name: "Candidate".to_string(),
                role: Role::Candidate,
                job_title: None,
                linkedin_url: None,
            }),
            StepData::Company(CompanyStep {
                company: None,
                website: None,
                bio: None,
            }),
            StepData::Security(SecurityStep {
                communication_preference: CommunicationPreference::Email,
                enable_mfa,
                phone_number: Some("+14155550123".to_string()),
            }),
        ];
        for step in steps {
            wizard.submit(&user.uid, step).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_verified_code_survives_lookup_failure() {
        let identity = Arc::new(LookupOutageAfterEnroll {
            inner: MemoryIdentityProvider::new(),
            enrolled: AtomicBool::new(false),
        });
        let token = identity.inner.register("u1", "u1@example.com", None).await;
        let (wizard, _, _events) = service(identity.clone());
        let user = auth("u1", token);

        fill_steps(&wizard, &user, true).await;
        wizard.start_mfa(&user).await.unwrap();

        let progress = wizard.verify_mfa(&user, VERIFICATION_CODE).await.unwrap();
        assert_eq!(progress.step(), WizardStep::Review);
        assert!(progress.mfa_verified);

        let saved = wizard.load("u1").await.unwrap();
        assert!(saved.mfa_verified);
        assert!(saved.mfa_session_info.is_none());
        assert!(saved.can_complete());
    }

    #[tokio::test]
    async fn test_completed_identity_cannot_restart() {
        let identity = Arc::new(MemoryIdentityProvider::new());
        let token = identity.register("u2", "u2@example.com", None).await;
        let (wizard, documents, _events) = service(identity);
        let user = auth("u2", token);

        fill_steps(&wizard, &user, false).await;
        wizard.complete("u2").await.unwrap();

        // Progress is gone once cleanup has run.
        ProgressRepository::new(documents).delete("u2").await.unwrap();

        let err = wizard.start(&user).await.unwrap_err();
        assert!(matches!(err, ApiError::Wizard(WizardError::AlreadyCompleted)));
    }
}
