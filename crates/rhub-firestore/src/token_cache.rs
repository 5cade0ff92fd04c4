//! OAuth token caching for the Firestore REST client.
//!
//! Tokens are refreshed a minute before they expire. Concurrent callers that
//! find a stale token serialize on the write lock, so only one refresh runs.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use gcp_auth::TokenProvider;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{FirestoreError, FirestoreResult};

/// Refresh this long before the reported expiry.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// OAuth scope for Firestore access.
pub const FIRESTORE_SCOPE: &str = "https://www.googleapis.com/auth/datastore";

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Instant::now() + TOKEN_REFRESH_MARGIN < self.expires_at
    }
}

/// Thread-safe access token cache.
pub struct TokenCache {
    auth: Arc<dyn TokenProvider>,
    cache: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub fn new(auth: Arc<dyn TokenProvider>) -> Self {
        Self {
            auth,
            cache: RwLock::new(None),
        }
    }

    /// Drop the cached token so the next call fetches a new one.
    pub async fn invalidate(&self) {
        *self.cache.write().await = None;
    }

    /// Get a valid access token, refreshing if necessary.
    pub async fn get_token(&self) -> FirestoreResult<String> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        let mut cache = self.cache.write().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh() {
                return Ok(cached.access_token.clone());
            }
        }

        let token = self
            .auth
            .token(&[FIRESTORE_SCOPE])
            .await
            .map_err(|e| FirestoreError::auth_error(format!("Failed to obtain auth token: {}", e)))?;

        let ttl = (token.expires_at() - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let access_token = token.as_str().to_string();
        *cache = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at: Instant::now() + ttl,
        });

        debug!(ttl_secs = ttl.as_secs(), "Refreshed Firestore auth token");
        Ok(access_token)
    }
}
