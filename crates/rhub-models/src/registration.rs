//! Registration wizard state machine.
//!
//! The wizard walks a newly signed-in identity through a fixed sequence of
//! steps. Its state is a step counter plus the values collected so far, and
//! it is persisted after every transition so the user can resume later.
//!
//! ```text
//! profile -> company -> security -> [mfa] -> review -> (completed)
//! ```
//!
//! The `mfa` step is only entered when the security step enabled MFA, and it
//! can only be left forwards by confirming a phone verification code.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use validator::Validate;

use crate::company::NewCompany;
use crate::user::{CommunicationPreference, JobTitle, NewUser, Role};
use crate::validation::{validation_message, PHONE_NUMBER_RE};

/// A wizard step. The numeric form (1-based) is what gets persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    Profile,
    Company,
    Security,
    Mfa,
    Review,
}

impl WizardStep {
    pub fn number(&self) -> u8 {
        match self {
            WizardStep::Profile => 1,
            WizardStep::Company => 2,
            WizardStep::Security => 3,
            WizardStep::Mfa => 4,
            WizardStep::Review => 5,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(WizardStep::Profile),
            2 => Some(WizardStep::Company),
            3 => Some(WizardStep::Security),
            4 => Some(WizardStep::Mfa),
            5 => Some(WizardStep::Review),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::Profile => "profile",
            WizardStep::Company => "company",
            WizardStep::Security => "security",
            WizardStep::Mfa => "mfa",
            WizardStep::Review => "review",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step 1: who the user is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileStep {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    pub role: Role,

    #[serde(default)]
    pub job_title: Option<JobTitle>,

    #[serde(default)]
    #[validate(url(message = "Invalid LinkedIn URL"))]
    pub linkedin_url: Option<String>,
}

/// Step 2: company and hiring needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompanyStep {
    #[serde(default)]
    pub company: Option<String>,

    #[serde(default)]
    #[validate(url(message = "Invalid website URL"))]
    pub website: Option<String>,

    /// Free-form bio; employers use it to describe their hiring needs.
    #[serde(default)]
    pub bio: Option<String>,
}

/// Step 3: contact preferences and MFA opt-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SecurityStep {
    #[serde(default)]
    pub communication_preference: CommunicationPreference,

    #[serde(default)]
    pub enable_mfa: bool,

    #[serde(default)]
    #[validate(regex(path = *PHONE_NUMBER_RE, message = "Invalid phone number format"))]
    #[schemars(regex(pattern = r"^\+[1-9]\d{1,14}$"))]
    pub phone_number: Option<String>,
}

/// Data submitted for one step, tagged with the step it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "step", content = "data", rename_all = "snake_case")]
pub enum StepData {
    Profile(ProfileStep),
    Company(CompanyStep),
    Security(SecurityStep),
}

impl StepData {
    pub fn step(&self) -> WizardStep {
        match self {
            StepData::Profile(_) => WizardStep::Profile,
            StepData::Company(_) => WizardStep::Company,
            StepData::Security(_) => WizardStep::Security,
        }
    }
}

/// Errors raised by wizard transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WizardError {
    #[error("Expected data for step '{expected}', got '{got}'")]
    WrongStep { expected: WizardStep, got: WizardStep },

    #[error("{0}")]
    Validation(String),

    #[error("Phone verification is not available at step '{0}'")]
    MfaNotExpected(WizardStep),

    #[error("No phone verification in progress")]
    MfaNotStarted,

    #[error("Phone verification must be completed before continuing")]
    MfaNotVerified,

    #[error("Registration cannot be completed from step '{0}'")]
    NotReady(WizardStep),

    #[error("Registration already completed")]
    AlreadyCompleted,
}

/// Persisted wizard progress, stored at `registrationProgress/{uid}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationProgress {
    pub uid: String,
    #[serde(default)]
    pub email: Option<String>,
    pub current_step: u8,
    /// Most recently finished step.
    #[serde(default)]
    pub last_step: u8,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub enable_mfa: bool,
    #[serde(default)]
    pub mfa_verified: bool,
    #[serde(default)]
    pub mfa_session_info: Option<String>,
    #[serde(default)]
    pub profile: Option<ProfileStep>,
    #[serde(default)]
    pub company: Option<CompanyStep>,
    #[serde(default)]
    pub security: Option<SecurityStep>,
    /// Epoch milliseconds of the first write.
    pub started_at: i64,
    /// Epoch milliseconds of the latest write.
    pub timestamp: i64,
}

impl RegistrationProgress {
    /// Fresh progress positioned at the first step.
    pub fn new(uid: impl Into<String>, email: Option<String>, now_ms: i64) -> Self {
        Self {
            uid: uid.into(),
            email,
            current_step: WizardStep::Profile.number(),
            last_step: 0,
            completed: false,
            enable_mfa: false,
            mfa_verified: false,
            mfa_session_info: None,
            profile: None,
            company: None,
            security: None,
            started_at: now_ms,
            timestamp: now_ms,
        }
    }

    /// Current step. Out-of-range stored values resume at the first step.
    pub fn step(&self) -> WizardStep {
        WizardStep::from_number(self.current_step).unwrap_or(WizardStep::Profile)
    }

    fn move_to(&mut self, step: WizardStep, now_ms: i64) {
        self.current_step = step.number();
        self.timestamp = now_ms;
    }

    fn ensure_open(&self) -> Result<(), WizardError> {
        if self.completed {
            Err(WizardError::AlreadyCompleted)
        } else {
            Ok(())
        }
    }

    fn role(&self) -> Option<Role> {
        self.profile.as_ref().map(|p| p.role)
    }

    /// Validate and store the current step's data, then advance.
    pub fn submit(&mut self, data: StepData, now_ms: i64) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;

        let current = self.step();
        if data.step() != current {
            return Err(WizardError::WrongStep {
                expected: current,
                got: data.step(),
            });
        }

        let next = match data {
            StepData::Profile(profile) => {
                profile
                    .validate()
                    .map_err(|e| WizardError::Validation(validation_message(&e)))?;
                self.profile = Some(profile);
                WizardStep::Company
            }
            StepData::Company(company) => {
                company
                    .validate()
                    .map_err(|e| WizardError::Validation(validation_message(&e)))?;
                let has_name = company
                    .company
                    .as_deref()
                    .is_some_and(|c| !c.trim().is_empty());
                if self.role() == Some(Role::Employer) && !has_name {
                    return Err(WizardError::Validation(
                        "Company name is required".to_string(),
                    ));
                }
                self.company = Some(company);
                WizardStep::Security
            }
            StepData::Security(security) => {
                security
                    .validate()
                    .map_err(|e| WizardError::Validation(validation_message(&e)))?;
                let needs_phone = security.enable_mfa
                    || security.communication_preference == CommunicationPreference::Sms;
                if needs_phone && security.phone_number.is_none() {
                    return Err(WizardError::Validation(
                        "Phone number is required for MFA or SMS notifications".to_string(),
                    ));
                }

                let phone_changed = self
                    .security
                    .as_ref()
                    .map(|s| s.phone_number != security.phone_number)
                    .unwrap_or(true);
                if !security.enable_mfa || phone_changed {
                    self.mfa_verified = false;
                }
                self.mfa_session_info = None;
                self.enable_mfa = security.enable_mfa;
                self.security = Some(security);

                if self.enable_mfa && !self.mfa_verified {
                    WizardStep::Mfa
                } else {
                    WizardStep::Review
                }
            }
        };

        self.last_step = current.number();
        self.move_to(next, now_ms);
        Ok(next)
    }

    /// Go back one step. Never moves before the first step.
    pub fn back(&mut self, now_ms: i64) -> Result<WizardStep, WizardError> {
        self.ensure_open()?;

        let previous = match self.step() {
            WizardStep::Profile | WizardStep::Company => WizardStep::Profile,
            WizardStep::Security => WizardStep::Company,
            WizardStep::Mfa | WizardStep::Review => WizardStep::Security,
        };
        if self.step() == WizardStep::Mfa {
            self.mfa_session_info = None;
        }
        self.move_to(previous, now_ms);
        Ok(previous)
    }

    /// Record that a verification code was sent for this session.
    pub fn begin_mfa(&mut self, session_info: impl Into<String>, now_ms: i64) -> Result<(), WizardError> {
        self.ensure_open()?;
        if self.step() != WizardStep::Mfa {
            return Err(WizardError::MfaNotExpected(self.step()));
        }
        self.mfa_session_info = Some(session_info.into());
        self.timestamp = now_ms;
        Ok(())
    }

    /// Session info of the verification in progress.
    pub fn pending_mfa_session(&self) -> Result<&str, WizardError> {
        self.ensure_open()?;
        if self.step() != WizardStep::Mfa {
            return Err(WizardError::MfaNotExpected(self.step()));
        }
        self.mfa_session_info
            .as_deref()
            .ok_or(WizardError::MfaNotStarted)
    }

    /// Mark the verification code as confirmed and advance to review.
    pub fn confirm_mfa(&mut self, now_ms: i64) -> Result<WizardStep, WizardError> {
        self.pending_mfa_session()?;
        self.mfa_verified = true;
        self.mfa_session_info = None;
        self.last_step = WizardStep::Mfa.number();
        self.move_to(WizardStep::Review, now_ms);
        Ok(WizardStep::Review)
    }

    /// True when `prepare_completion` would succeed.
    pub fn can_complete(&self) -> bool {
        self.prepare_completion().is_ok()
    }

    /// Build the account payloads without changing state.
    ///
    /// The company payload is only produced for employers; its `user_id`
    /// is filled in once the user exists.
    pub fn prepare_completion(&self) -> Result<(NewUser, Option<NewCompany>), WizardError> {
        self.ensure_open()?;
        if self.step() != WizardStep::Review {
            return Err(WizardError::NotReady(self.step()));
        }
        if self.enable_mfa && !self.mfa_verified {
            return Err(WizardError::MfaNotVerified);
        }

        let profile = self
            .profile
            .as_ref()
            .ok_or(WizardError::NotReady(WizardStep::Profile))?;
        let security = self
            .security
            .as_ref()
            .ok_or(WizardError::NotReady(WizardStep::Security))?;
        let company = self.company.as_ref();
        let email = self
            .email
            .clone()
            .ok_or_else(|| WizardError::Validation("An email address is required".to_string()))?;

        let user = NewUser {
            email,
            role: profile.role,
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            phone_number: security.phone_number.clone(),
            job_title: profile.job_title,
            linkedin_url: profile.linkedin_url.clone(),
            profile_picture: None,
            communication_preference: security.communication_preference,
            company: company.and_then(|c| c.company.clone()),
            bio: company.and_then(|c| c.bio.clone()),
            firebase_uid: Some(self.uid.clone()),
            mfa_enabled: self.enable_mfa && self.mfa_verified,
        };
        user.validate()
            .map_err(|e| WizardError::Validation(validation_message(&e)))?;

        let new_company = match (profile.role, company) {
            (Role::Employer, Some(c)) => c.company.as_ref().map(|name| NewCompany {
                user_id: 0,
                name: name.clone(),
                website: c.website.clone(),
                industry: None,
                size: None,
                description: c.bio.clone(),
            }),
            _ => None,
        };

        Ok((user, new_company))
    }

    /// Flag the registration as finished.
    pub fn mark_completed(&mut self, now_ms: i64) -> Result<(), WizardError> {
        self.prepare_completion()?;
        self.completed = true;
        self.last_step = WizardStep::Review.number();
        self.timestamp = now_ms;
        Ok(())
    }
}
