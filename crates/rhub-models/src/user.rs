//! User accounts.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::PHONE_NUMBER_RE;

/// Account role chosen during registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employer,
    Candidate,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Employer => "employer",
            Role::Candidate => "candidate",
        }
    }
}

/// Job title offered in the profile step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum JobTitle {
    #[serde(rename = "Talent Acquisition Manager")]
    TalentAcquisitionManager,
    #[serde(rename = "HR Director")]
    HrDirector,
    #[serde(rename = "CEO")]
    Ceo,
    #[serde(rename = "Other")]
    Other,
}

/// How the user wants to be contacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationPreference {
    #[default]
    Email,
    Sms,
    Platform,
}

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub job_title: Option<JobTitle>,
    pub linkedin_url: Option<String>,
    pub profile_picture: Option<String>,
    pub communication_preference: CommunicationPreference,
    pub company: Option<String>,
    pub bio: Option<String>,
    /// External identity provider uid, when the account was created through the wizard.
    pub firebase_uid: Option<String>,
    pub mfa_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a stored user from an insert payload.
    pub fn from_new(id: u64, new: NewUser) -> Self {
        Self {
            id,
            email: new.email,
            role: new.role,
            first_name: new.first_name,
            last_name: new.last_name,
            phone_number: new.phone_number,
            job_title: new.job_title,
            linkedin_url: new.linkedin_url,
            profile_picture: new.profile_picture,
            communication_preference: new.communication_preference,
            company: new.company,
            bio: new.bio,
            firebase_uid: new.firebase_uid,
            mfa_enabled: new.mfa_enabled,
            created_at: Utc::now(),
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Payload accepted by `POST /api/auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    pub role: Role,

    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[serde(default)]
    #[validate(regex(path = *PHONE_NUMBER_RE, message = "Invalid phone number format"))]
    #[schemars(regex(pattern = r"^\+[1-9]\d{1,14}$"))]
    pub phone_number: Option<String>,

    #[serde(default)]
    pub job_title: Option<JobTitle>,

    #[serde(default)]
    #[validate(url(message = "Invalid LinkedIn URL"))]
    pub linkedin_url: Option<String>,

    #[serde(default)]
    #[validate(url(message = "Invalid profile picture URL"))]
    pub profile_picture: Option<String>,

    #[serde(default)]
    pub communication_preference: CommunicationPreference,

    #[serde(default)]
    pub company: Option<String>,

    #[serde(default)]
    pub bio: Option<String>,

    /// Set only by wizard completion from a verified ID token; never read
    /// from request bodies.
    #[serde(default, skip_deserializing)]
    pub firebase_uid: Option<String>,

    /// Set only after a verified phone enrollment.
    #[serde(default, skip_deserializing)]
    pub mfa_enabled: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validation_message;

    fn valid_user() -> NewUser {
        NewUser {
            email: "ada@example.com".to_string(),
            role: Role::Employer,
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            phone_number: Some("+14155550123".to_string()),
            job_title: Some(JobTitle::HrDirector),
            linkedin_url: Some("https://www.linkedin.com/in/ada".to_string()),
            profile_picture: None,
            communication_preference: CommunicationPreference::Email,
            company: Some("Analytical Engines".to_string()),
            bio: None,
            firebase_uid: None,
            mfa_enabled: false,
        }
    }

    #[test]
    fn test_valid_user_passes() {
        assert!(valid_user().validate().is_ok());
    }

    #[test]
    fn test_missing_first_name_rejected() {
        let mut user = valid_user();
        user.first_name = String::new();
        let errors = user.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "First name is required");
    }

    #[test]
    fn test_bad_phone_rejected() {
        let mut user = valid_user();
        user.phone_number = Some("555-0123".to_string());
        let errors = user.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "Invalid phone number format");
    }

    #[test]
    fn test_bad_linkedin_rejected() {
        let mut user = valid_user();
        user.linkedin_url = Some("not a url".to_string());
        let errors = user.validate().unwrap_err();
        assert_eq!(validation_message(&errors), "Invalid LinkedIn URL");
    }

    #[test]
    fn test_job_title_wire_names() {
        let json = serde_json::to_string(&JobTitle::TalentAcquisitionManager).unwrap();
        assert_eq!(json, "\"Talent Acquisition Manager\"");
        let parsed: JobTitle = serde_json::from_str("\"HR Director\"").unwrap();
        assert_eq!(parsed, JobTitle::HrDirector);
    }

    #[test]
    fn test_payload_defaults() {
        let json = serde_json::json!({
            "email": "c@example.com",
            "role": "candidate",
            "firstName": "Cee",
            "lastName": "Dee"
        });
        let user: NewUser = serde_json::from_value(json).unwrap();
        assert_eq!(user.communication_preference, CommunicationPreference::Email);
        assert!(!user.mfa_enabled);
        assert!(user.validate().is_ok());
    }

    #[test]
    fn test_unknown_role_rejected() {
        let json = serde_json::json!({
            "email": "c@example.com",
            "role": "admin",
            "firstName": "Cee",
            "lastName": "Dee"
        });
        assert!(serde_json::from_value::<NewUser>(json).is_err());
    }

    #[test]
    fn test_schema_carries_phone_pattern() {
        let schema = serde_json::to_value(schemars::schema_for!(NewUser)).unwrap();
        let phone = schema["properties"]["phoneNumber"].to_string();
        assert!(phone.contains(r#""pattern":"^\\+[1-9]\\d{1,14}$""#), "{}", phone);
    }

    #[test]
    fn test_identity_fields_ignored_on_input() {
        let json = serde_json::json!({
            "email": "c@example.com",
            "role": "candidate",
            "firstName": "Cee",
            "lastName": "Dee",
            "firebaseUid": "someone-else",
            "mfaEnabled": true
        });
        let user: NewUser = serde_json::from_value(json).unwrap();
        assert!(user.firebase_uid.is_none());
        assert!(!user.mfa_enabled);
    }
}
