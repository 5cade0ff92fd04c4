//! Identity provider types.

use serde::{Deserialize, Serialize};

/// Verified claims of an ID token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityClaims {
    pub uid: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

/// Raw Firebase ID token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FirebaseTokenClaims {
    /// User ID
    pub sub: String,
    pub email: Option<String>,
    pub email_verified: Option<bool>,
    pub iss: String,
    /// Firebase project ID
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub auth_time: Option<i64>,
}

impl From<FirebaseTokenClaims> for IdentityClaims {
    fn from(claims: FirebaseTokenClaims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
        }
    }
}

/// A second factor enrolled on an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledFactor {
    /// Factor kind, `phone` for SMS verification.
    pub factor_id: String,
    pub enrollment_id: Option<String>,
    pub phone_number: Option<String>,
    pub display_name: Option<String>,
}

/// An account as seen by the identity provider.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub enrolled_factors: Vec<EnrolledFactor>,
}

impl IdentityUser {
    pub fn has_mfa(&self) -> bool {
        !self.enrolled_factors.is_empty()
    }
}

// =============================================================================
// Identity Toolkit wire types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartEnrollmentRequest<'a> {
    pub id_token: &'a str,
    pub phone_enrollment_info: PhoneEnrollmentInfo<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhoneEnrollmentInfo<'a> {
    pub phone_number: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StartEnrollmentResponse {
    pub phone_session_info: PhoneSessionInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhoneSessionInfo {
    pub session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FinalizeEnrollmentRequest<'a> {
    pub id_token: &'a str,
    pub phone_verification_info: PhoneVerificationInfo<'a>,
    pub display_name: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PhoneVerificationInfo<'a> {
    pub session_info: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LookupRequest<'a> {
    pub local_id: [&'a str; 1],
}

#[derive(Debug, Deserialize)]
pub(crate) struct LookupResponse {
    #[serde(default)]
    pub users: Vec<ToolkitUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToolkitUser {
    pub local_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(default)]
    pub mfa_info: Vec<ToolkitMfaInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ToolkitMfaInfo {
    pub mfa_enrollment_id: Option<String>,
    pub display_name: Option<String>,
    pub phone_info: Option<String>,
}

impl From<ToolkitUser> for IdentityUser {
    fn from(user: ToolkitUser) -> Self {
        Self {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name,
            enrolled_factors: user
                .mfa_info
                .into_iter()
                .map(|info| EnrolledFactor {
                    factor_id: if info.phone_info.is_some() { "phone" } else { "unknown" }
                        .to_string(),
                    enrollment_id: info.mfa_enrollment_id,
                    phone_number: info.phone_info,
                    display_name: info.display_name,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolkitErrorBody {
    pub error: ToolkitError,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ToolkitError {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_user_conversion() {
        let raw = serde_json::json!({
            "users": [{
                "localId": "u1",
                "email": "a@example.com",
                "displayName": "Ada",
                "mfaInfo": [{
                    "mfaEnrollmentId": "e1",
                    "displayName": "Phone",
                    "phoneInfo": "+14155550123"
                }]
            }]
        });
        let lookup: LookupResponse = serde_json::from_value(raw).unwrap();
        let user: IdentityUser = lookup.users.into_iter().next().unwrap().into();
        assert_eq!(user.uid, "u1");
        assert!(user.has_mfa());
        assert_eq!(user.enrolled_factors[0].factor_id, "phone");
    }

    #[test]
    fn test_user_without_mfa() {
        let raw = serde_json::json!({ "users": [{ "localId": "u2" }] });
        let lookup: LookupResponse = serde_json::from_value(raw).unwrap();
        let user: IdentityUser = lookup.users.into_iter().next().unwrap().into();
        assert!(!user.has_mfa());
        assert!(user.email.is_none());
    }
}
