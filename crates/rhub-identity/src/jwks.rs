//! Firebase ID token verification against Google's published keys.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::error::{IdentityError, IdentityResult};
use crate::types::{FirebaseTokenClaims, IdentityClaims};

/// Google JWKS URL for Firebase Auth.
pub const GOOGLE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Firebase token issuer prefix.
pub const FIREBASE_ISSUER_PREFIX: &str = "https://securetoken.google.com/";

const JWKS_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Deserialize)]
struct JwksResponse {
    keys: Vec<JwkKey>,
}

#[derive(Debug, Clone, Deserialize)]
struct JwkKey {
    kid: String,
    n: String,
    e: String,
}

struct KeySet {
    keys: HashMap<String, DecodingKey>,
    fetched_at: Option<Instant>,
}

/// Cached signing keys. Fetched on first use and refreshed hourly.
pub struct JwksCache {
    http: Client,
    url: String,
    project_id: String,
    keys: RwLock<KeySet>,
}

impl JwksCache {
    pub fn new(http: Client, project_id: impl Into<String>) -> Self {
        Self::with_url(http, project_id, GOOGLE_JWKS_URL)
    }

    pub fn with_url(http: Client, project_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            project_id: project_id.into(),
            keys: RwLock::new(KeySet {
                keys: HashMap::new(),
                fetched_at: None,
            }),
        }
    }

    async fn refresh_keys(&self) -> IdentityResult<()> {
        debug!("Refreshing JWKS keys");

        let jwks: JwksResponse = self.http.get(&self.url).send().await?.json().await?;

        let mut keys = HashMap::new();
        for jwk in jwks.keys {
            let key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
                .map_err(|e| IdentityError::Auth(format!("Invalid JWKS key {}: {}", jwk.kid, e)))?;
            keys.insert(jwk.kid, key);
        }

        let key_count = keys.len();
        *self.keys.write().await = KeySet {
            keys,
            fetched_at: Some(Instant::now()),
        };

        debug!("Refreshed {} JWKS keys", key_count);
        Ok(())
    }

    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        let needs_refresh = {
            let set = self.keys.read().await;
            match set.fetched_at {
                Some(at) => at.elapsed() > JWKS_CACHE_TTL || !set.keys.contains_key(kid),
                None => true,
            }
        };

        if needs_refresh {
            if let Err(e) = self.refresh_keys().await {
                warn!("Failed to refresh JWKS keys: {}", e);
            }
        }

        self.keys.read().await.keys.get(kid).cloned()
    }

    /// Verify an RS256-signed Firebase ID token.
    pub async fn verify(&self, token: &str) -> IdentityResult<IdentityClaims> {
        let header = decode_header(token)
            .map_err(|e| IdentityError::invalid_token(format!("Invalid token header: {}", e)))?;

        let kid = header
            .kid
            .ok_or_else(|| IdentityError::invalid_token("Token missing key ID"))?;

        let key = self
            .get_key(&kid)
            .await
            .ok_or_else(|| IdentityError::invalid_token("Unknown key ID"))?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[format!("{}{}", FIREBASE_ISSUER_PREFIX, self.project_id)]);
        validation.set_audience(&[&self.project_id]);

        let token_data = decode::<FirebaseTokenClaims>(token, &key, &validation)
            .map_err(|e| IdentityError::invalid_token(format!("Token validation failed: {}", e)))?;

        Ok(token_data.claims.into())
    }
}
