//! Trigger configuration.

use std::time::Duration;

/// Trigger configuration.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    /// Delay before a completed registration progress document is deleted
    pub cleanup_delay: Duration,
    /// How long shutdown waits for queued events to drain
    pub shutdown_timeout: Duration,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            cleanup_delay: Duration::from_secs(24 * 60 * 60),
            shutdown_timeout: Duration::from_secs(10),
        }
    }
}

impl TriggerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cleanup_delay: std::env::var("REGISTRATION_CLEANUP_DELAY_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.cleanup_delay),
            shutdown_timeout: std::env::var("TRIGGER_SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.shutdown_timeout),
        }
    }
}
