//! Structured trigger logging.

use tracing::{error, info, warn, Span};

/// Logger carrying the trigger name and subject (usually a uid).
#[derive(Debug, Clone)]
pub struct TriggerLogger {
    trigger: &'static str,
    subject: String,
}

impl TriggerLogger {
    pub fn new(trigger: &'static str, subject: impl Into<String>) -> Self {
        Self {
            trigger,
            subject: subject.into(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(trigger = self.trigger, subject = %self.subject, "Trigger started: {}", message);
    }

    pub fn log_skip(&self, message: &str) {
        info!(trigger = self.trigger, subject = %self.subject, "Trigger skipped: {}", message);
    }

    pub fn log_warning(&self, message: &str) {
        warn!(trigger = self.trigger, subject = %self.subject, "Trigger warning: {}", message);
    }

    pub fn log_error(&self, message: &str) {
        error!(trigger = self.trigger, subject = %self.subject, "Trigger error: {}", message);
    }

    pub fn log_completion(&self, message: &str) {
        info!(trigger = self.trigger, subject = %self.subject, "Trigger completed: {}", message);
    }

    pub fn trigger(&self) -> &'static str {
        self.trigger
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Span for attaching nested document-store and identity calls.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("trigger", trigger = self.trigger, subject = %self.subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logger_fields() {
        let logger = TriggerLogger::new("send_welcome_email", "u1");
        assert_eq!(logger.trigger(), "send_welcome_email");
        assert_eq!(logger.subject(), "u1");
    }
}
