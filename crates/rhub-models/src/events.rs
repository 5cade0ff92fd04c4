//! Documents written by lifecycle triggers.

use std::collections::HashMap;

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Email template reference understood by the mail delivery extension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MailTemplate {
    pub name: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

/// A queued email, stored in the `mail` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MailMessage {
    pub to: String,
    pub template: MailTemplate,
}

impl MailMessage {
    pub fn template(to: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            template: MailTemplate {
                name: name.into(),
                data: HashMap::new(),
            },
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.template.data.insert(key.into(), value.into());
        self
    }
}

/// An analytics record, stored in the `analytics` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event: String,
    pub user_id: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, serde_json::Value>,
}

impl AnalyticsEvent {
    pub fn new(event: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            event: event.into(),
            user_id: user_id.into(),
            timestamp: Utc::now().timestamp_millis(),
            data: HashMap::new(),
        }
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_wire_shape() {
        let mail = MailMessage::template("a@example.com", "welcome").with_data("name", "there");
        let value = serde_json::to_value(&mail).unwrap();
        assert_eq!(value["to"], "a@example.com");
        assert_eq!(value["template"]["name"], "welcome");
        assert_eq!(value["template"]["data"]["name"], "there");
    }

    #[test]
    fn test_analytics_omits_empty_data() {
        let event = AnalyticsEvent::new("welcome_email_sent", "uid-1");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["userId"], "uid-1");
        assert!(value.get("data").is_none());
        assert!(value["timestamp"].as_i64().unwrap() > 0);
    }
}
