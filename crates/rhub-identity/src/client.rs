//! Identity Toolkit REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use gcp_auth::TokenProvider;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::jwks::JwksCache;
use crate::provider::IdentityProvider;
use crate::types::{
    FinalizeEnrollmentRequest, FirebaseTokenClaims, IdentityClaims, IdentityUser, LookupRequest,
    LookupResponse, PhoneEnrollmentInfo, PhoneVerificationInfo, StartEnrollmentRequest,
    StartEnrollmentResponse, ToolkitErrorBody,
};

/// Scope for admin account lookups.
const ADMIN_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Display name given to enrolled phone factors.
const PHONE_FACTOR_NAME: &str = "Phone";

/// Configuration for the identity client.
#[derive(Debug, Clone)]
pub struct IdentityConfig {
    /// Firebase project ID
    pub project_id: String,
    /// Web API key used for end-user endpoints
    pub api_key: String,
    /// `host:port` of the auth emulator, if used
    pub emulator_host: Option<String>,
    /// Request timeout
    pub timeout: Duration,
}

impl IdentityConfig {
    /// Create config from environment variables.
    pub fn from_env() -> IdentityResult<Self> {
        let emulator_host = std::env::var("FIREBASE_AUTH_EMULATOR_HOST")
            .ok()
            .filter(|h| !h.is_empty());

        let project_id = std::env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| std::env::var("GCP_PROJECT_ID"))
            .map_err(|_| IdentityError::config("FIREBASE_PROJECT_ID or GCP_PROJECT_ID must be set"))?;

        let api_key = match (std::env::var("FIREBASE_API_KEY"), &emulator_host) {
            (Ok(key), _) => key,
            (Err(_), Some(_)) => "demo-key".to_string(),
            (Err(_), None) => return Err(IdentityError::config("FIREBASE_API_KEY must be set")),
        };

        Ok(Self {
            project_id,
            api_key,
            emulator_host,
            timeout: Duration::from_secs(
                std::env::var("IDENTITY_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
        })
    }

    pub fn emulator(host: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            api_key: "demo-key".to_string(),
            emulator_host: Some(host.into()),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Client for the Identity Toolkit API.
pub struct FirebaseIdentityClient {
    http: Client,
    config: IdentityConfig,
    root: String,
    jwks: JwksCache,
    admin: Option<Arc<dyn TokenProvider>>,
}

impl FirebaseIdentityClient {
    /// Create a new client. Outside the emulator this loads application
    /// default credentials for admin lookups.
    pub async fn new(config: IdentityConfig) -> IdentityResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("rhub-identity/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(IdentityError::Network)?;

        let (root, admin) = match &config.emulator_host {
            Some(host) => {
                info!(host = %host, "Using Firebase auth emulator");
                (format!("http://{}/identitytoolkit.googleapis.com", host), None)
            }
            None => {
                let provider = gcp_auth::provider()
                    .await
                    .map_err(|e| IdentityError::Auth(format!("Failed to load credentials: {}", e)))?;
                ("https://identitytoolkit.googleapis.com".to_string(), Some(provider))
            }
        };

        let jwks = JwksCache::new(http.clone(), config.project_id.clone());

        Ok(Self {
            http,
            config,
            root,
            jwks,
            admin,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> IdentityResult<Self> {
        Self::new(IdentityConfig::from_env()?).await
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}?key={}", self.root, path, self.config.api_key)
    }

    async fn admin_token(&self) -> IdentityResult<String> {
        match &self.admin {
            None => Ok("owner".to_string()),
            Some(provider) => provider
                .token(&[ADMIN_SCOPE])
                .await
                .map(|t| t.as_str().to_string())
                .map_err(|e| IdentityError::Auth(format!("Failed to obtain admin token: {}", e))),
        }
    }

    async fn post<B: Serialize, R: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
        bearer: Option<&str>,
    ) -> IdentityResult<R> {
        let mut request = self.http.post(url).json(body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if status.is_success() {
            return Ok(response.json().await?);
        }

        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ToolkitErrorBody>(&text) {
            Ok(body) => Err(IdentityError::from_provider_code(&body.error.message)),
            Err(_) => Err(IdentityError::RequestFailed(format!("{}: {}", status, text))),
        }
    }

    /// The auth emulator issues unsigned tokens; only the payload is checked.
    fn decode_emulator_token(&self, token: &str) -> IdentityResult<IdentityClaims> {
        let payload = token
            .split('.')
            .nth(1)
            .ok_or_else(|| IdentityError::invalid_token("Malformed token"))?;
        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|e| IdentityError::invalid_token(format!("Malformed token payload: {}", e)))?;
        let claims: FirebaseTokenClaims = serde_json::from_slice(&bytes)
            .map_err(|e| IdentityError::invalid_token(format!("Malformed token claims: {}", e)))?;

        if claims.aud != self.config.project_id {
            return Err(IdentityError::invalid_token("Token audience mismatch"));
        }
        if claims.exp < Utc::now().timestamp() {
            return Err(IdentityError::invalid_token("Token expired"));
        }
        Ok(claims.into())
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityClient {
    async fn verify_id_token(&self, id_token: &str) -> IdentityResult<IdentityClaims> {
        if self.config.emulator_host.is_some() {
            self.decode_emulator_token(id_token)
        } else {
            self.jwks.verify(id_token).await
        }
    }

    async fn get_user(&self, uid: &str) -> IdentityResult<Option<IdentityUser>> {
        let url = format!(
            "{}/v1/projects/{}/accounts:lookup",
            self.root, self.config.project_id
        );
        let token = self.admin_token().await?;
        let response: LookupResponse = self
            .post(&url, &LookupRequest { local_id: [uid] }, Some(&token))
            .await?;
        Ok(response.users.into_iter().next().map(IdentityUser::from))
    }

    async fn start_phone_enrollment(&self, id_token: &str, phone_number: &str) -> IdentityResult<String> {
        let url = self.public_url("v2/accounts/mfaEnrollment:start");
        let request = StartEnrollmentRequest {
            id_token,
            phone_enrollment_info: PhoneEnrollmentInfo { phone_number },
        };
        let response: StartEnrollmentResponse = self.post(&url, &request, None).await?;
        debug!("Started phone MFA enrollment");
        Ok(response.phone_session_info.session_info)
    }

    async fn finalize_phone_enrollment(
        &self,
        id_token: &str,
        session_info: &str,
        code: &str,
    ) -> IdentityResult<()> {
        let url = self.public_url("v2/accounts/mfaEnrollment:finalize");
        let request = FinalizeEnrollmentRequest {
            id_token,
            phone_verification_info: PhoneVerificationInfo { session_info, code },
            display_name: PHONE_FACTOR_NAME,
        };
        let _: serde_json::Value = self.post(&url, &request, None).await?;
        debug!("Finalized phone MFA enrollment");
        Ok(())
    }

    async fn health_check(&self) -> bool {
        let Some(host) = &self.config.emulator_host else {
            return true;
        };
        match self.http.get(format!("http://{}/", host)).send().await {
            Ok(_) => true,
            Err(e) => {
                warn!("Auth emulator health check error: {}", e);
                false
            }
        }
    }
}
