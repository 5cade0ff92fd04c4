//! Cookie sessions.
//!
//! A session id is random; the cookie carries `<id>.<signature>` where the
//! signature is HMAC-SHA256 over the id. Sessions live in process memory
//! and expire after the configured TTL.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::metrics;
use crate::state::AppState;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "rhub_session";

type HmacSha256 = Hmac<Sha256>;

struct SessionEntry {
    user_id: u64,
    expires_at: Instant,
}

/// In-memory session table.
pub struct SessionStore {
    secret: Vec<u8>,
    ttl: Duration,
    secure_cookies: bool,
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionStore {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration, secure_cookies: bool) -> Self {
        Self {
            secret: secret.into(),
            ttl,
            secure_cookies,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    fn sign(&self, id: &str) -> Option<String> {
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(id.as_bytes());
        Some(URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes()))
    }

    /// Split a cookie value and check its signature.
    fn verified_id<'a>(&self, value: &'a str) -> Option<&'a str> {
        let (id, sig) = value.split_once('.')?;
        let sig_bytes = URL_SAFE_NO_PAD.decode(sig).ok()?;
        let mut mac = HmacSha256::new_from_slice(&self.secret).ok()?;
        mac.update(id.as_bytes());
        mac.verify_slice(&sig_bytes).ok()?;
        Some(id)
    }

    /// Start a session and return the signed cookie value.
    pub async fn create(&self, user_id: u64) -> Result<String, ApiError> {
        let id = Uuid::new_v4().simple().to_string();
        let sig = self
            .sign(&id)
            .ok_or_else(|| ApiError::internal("Invalid session secret"))?;

        let mut sessions = self.sessions.write().await;
        let now = Instant::now();
        sessions.retain(|_, s| s.expires_at > now);
        sessions.insert(
            id.clone(),
            SessionEntry {
                user_id,
                expires_at: now + self.ttl,
            },
        );
        metrics::record_session_created();
        debug!(user_id, "Session created");

        Ok(format!("{}.{}", id, sig))
    }

    /// User id of a live session, if the cookie value is authentic.
    pub async fn resolve(&self, value: &str) -> Option<u64> {
        let id = self.verified_id(value)?;
        let sessions = self.sessions.read().await;
        sessions
            .get(id)
            .filter(|s| s.expires_at > Instant::now())
            .map(|s| s.user_id)
    }

    /// End a session. Unknown or forged values are ignored.
    pub async fn destroy(&self, value: &str) {
        if let Some(id) = self.verified_id(value) {
            self.sessions.write().await.remove(id);
        }
    }

    /// Session cookie carrying `value`.
    pub fn cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.secure_cookies)
            .build()
    }

    /// Start a session and add its cookie to the jar.
    pub async fn login(&self, jar: CookieJar, user_id: u64) -> Result<CookieJar, ApiError> {
        let value = self.create(user_id).await?;
        Ok(jar.add(self.cookie(value)))
    }

    /// End the jar's session, if any, and remove its cookie.
    pub async fn logout(&self, jar: CookieJar) -> CookieJar {
        if let Some(cookie) = jar.get(SESSION_COOKIE) {
            self.destroy(cookie.value()).await;
        }
        jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
    }
}

/// The signed-in user of a session-gated request.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser {
    pub user_id: u64,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let cookie = jar
            .get(SESSION_COOKIE)
            .filter(|c| !c.value().is_empty())
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        let user_id = state
            .sessions
            .resolve(cookie.value())
            .await
            .ok_or_else(|| ApiError::unauthorized("Unauthorized"))?;

        Ok(SessionUser { user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(ttl: Duration) -> SessionStore {
        SessionStore::new("test-secret", ttl, false)
    }

    #[tokio::test]
    async fn test_create_and_resolve() {
        let sessions = store(Duration::from_secs(60));
        let value = sessions.create(7).await.unwrap();
        assert_eq!(sessions.resolve(&value).await, Some(7));

        sessions.destroy(&value).await;
        assert_eq!(sessions.resolve(&value).await, None);
    }

    #[tokio::test]
    async fn test_tampered_signature_rejected() {
        let sessions = store(Duration::from_secs(60));
        let value = sessions.create(7).await.unwrap();
        let (id, _) = value.split_once('.').unwrap();

        assert_eq!(sessions.resolve(id).await, None);
        assert_eq!(sessions.resolve(&format!("{}.AAAA", id)).await, None);

        let other = SessionStore::new("other-secret", Duration::from_secs(60), false);
        assert_eq!(other.resolve(&value).await, None);
    }

    #[tokio::test]
    async fn test_expired_session_rejected() {
        let sessions = store(Duration::ZERO);
        let value = sessions.create(7).await.unwrap();
        assert_eq!(sessions.resolve(&value).await, None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = store(Duration::from_secs(60)).cookie("abc.def".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
