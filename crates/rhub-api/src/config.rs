//! API configuration.

use std::time::Duration;

/// Which document store backs wizard progress, mail and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStoreKind {
    Memory,
    Firestore,
}

/// Which identity provider verifies ID tokens and enrolls second factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityProviderKind {
    Memory,
    Firebase,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Rate limit requests per second, per client IP
    pub rate_limit_rps: u32,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Secret for signing session cookies. Generated per process when unset.
    pub session_secret: Option<String>,
    /// Session lifetime
    pub session_ttl: Duration,
    pub document_store: DocumentStoreKind,
    pub identity_provider: IdentityProviderKind,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            rate_limit_rps: 10,
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            session_secret: None,
            session_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            document_store: DocumentStoreKind::Memory,
            identity_provider: IdentityProviderKind::Memory,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            rate_limit_rps: std::env::var("RATE_LIMIT_RPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.rate_limit_rps),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_body_size),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            session_secret: std::env::var("SESSION_SECRET").ok().filter(|s| !s.is_empty()),
            session_ttl: std::env::var("SESSION_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.session_ttl),
            document_store: match std::env::var("DOCUMENT_STORE").as_deref() {
                Ok("firestore") => DocumentStoreKind::Firestore,
                _ => DocumentStoreKind::Memory,
            },
            identity_provider: match std::env::var("IDENTITY_PROVIDER").as_deref() {
                Ok("firebase") => IdentityProviderKind::Firebase,
                _ => IdentityProviderKind::Memory,
            },
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_backends_from_env() {
        std::env::set_var("DOCUMENT_STORE", "firestore");
        std::env::set_var("IDENTITY_PROVIDER", "firebase");
        std::env::set_var("SESSION_TTL_SECS", "60");
        let config = ApiConfig::from_env();
        assert_eq!(config.document_store, DocumentStoreKind::Firestore);
        assert_eq!(config.identity_provider, IdentityProviderKind::Firebase);
        assert_eq!(config.session_ttl, Duration::from_secs(60));

        std::env::remove_var("DOCUMENT_STORE");
        std::env::remove_var("IDENTITY_PROVIDER");
        std::env::remove_var("SESSION_TTL_SECS");
        let config = ApiConfig::from_env();
        assert_eq!(config.document_store, DocumentStoreKind::Memory);
        assert_eq!(config.identity_provider, IdentityProviderKind::Memory);
    }

    #[test]
    fn test_is_production() {
        let config = ApiConfig {
            environment: "Production".to_string(),
            ..ApiConfig::default()
        };
        assert!(config.is_production());
        assert!(!ApiConfig::default().is_production());
    }
}
