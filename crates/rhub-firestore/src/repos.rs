//! Typed repositories over the document store.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use rhub_models::{AnalyticsEvent, MailMessage, RegistrationProgress};

use crate::error::{FirestoreError, FirestoreResult};
use crate::store::{DocumentStore, Fields};

/// Collection names.
pub mod collections {
    /// Wizard progress, keyed by identity uid.
    pub const REGISTRATION_PROGRESS: &str = "registrationProgress";
    /// Outgoing mail picked up by the mail delivery extension.
    pub const MAIL: &str = "mail";
    pub const ANALYTICS: &str = "analytics";
}

/// Serialize a value into document fields.
pub fn to_fields<T: Serialize>(value: &T) -> FirestoreResult<Fields> {
    match serde_json::to_value(value)? {
        serde_json::Value::Object(map) => Ok(map),
        other => Err(FirestoreError::serialization(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

/// Deserialize document fields into a value.
pub fn from_fields<T: DeserializeOwned>(fields: Fields) -> FirestoreResult<T> {
    serde_json::from_value(serde_json::Value::Object(fields))
        .map_err(|e| FirestoreError::serialization(e.to_string()))
}

/// Registration wizard progress at `registrationProgress/{uid}`.
#[derive(Clone)]
pub struct ProgressRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProgressRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> FirestoreResult<Option<RegistrationProgress>> {
        self.store
            .get(collections::REGISTRATION_PROGRESS, uid)
            .await?
            .map(from_fields)
            .transpose()
    }

    pub async fn save(&self, progress: &RegistrationProgress) -> FirestoreResult<()> {
        debug!(
            uid = %progress.uid,
            step = progress.current_step,
            completed = progress.completed,
            "Saving registration progress"
        );
        self.store
            .set(
                collections::REGISTRATION_PROGRESS,
                &progress.uid,
                to_fields(progress)?,
            )
            .await
    }

    pub async fn delete(&self, uid: &str) -> FirestoreResult<()> {
        self.store
            .delete(collections::REGISTRATION_PROGRESS, uid)
            .await
    }
}

/// Queue of outgoing emails.
#[derive(Clone)]
pub struct MailQueue {
    store: Arc<dyn DocumentStore>,
}

impl MailQueue {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Queue a message and return its document id.
    pub async fn enqueue(&self, message: &MailMessage) -> FirestoreResult<String> {
        let id = self.store.add(collections::MAIL, to_fields(message)?).await?;
        debug!(mail_id = %id, template = %message.template.name, "Queued mail");
        Ok(id)
    }

    pub async fn list(&self) -> FirestoreResult<Vec<MailMessage>> {
        self.store
            .list(collections::MAIL)
            .await?
            .into_iter()
            .map(|(_, fields)| from_fields(fields))
            .collect()
    }
}

/// Analytics event log.
#[derive(Clone)]
pub struct AnalyticsRepository {
    store: Arc<dyn DocumentStore>,
}

impl AnalyticsRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn record(&self, event: &AnalyticsEvent) -> FirestoreResult<String> {
        let id = self
            .store
            .add(collections::ANALYTICS, to_fields(event)?)
            .await?;
        debug!(event = %event.event, user_id = %event.user_id, "Recorded analytics event");
        Ok(id)
    }

    pub async fn list(&self) -> FirestoreResult<Vec<AnalyticsEvent>> {
        self.store
            .list(collections::ANALYTICS)
            .await?
            .into_iter()
            .map(|(_, fields)| from_fields(fields))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryDocumentStore;

    #[tokio::test]
    async fn test_progress_roundtrip_through_store() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let repo = ProgressRepository::new(Arc::clone(&store));

        assert!(repo.get("u1").await.unwrap().is_none());

        let progress = RegistrationProgress::new("u1", Some("a@example.com".to_string()), 10);
        repo.save(&progress).await.unwrap();

        let raw = store
            .get(collections::REGISTRATION_PROGRESS, "u1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(raw["currentStep"], serde_json::json!(1));
        assert_eq!(raw["completed"], serde_json::json!(false));

        assert_eq!(repo.get("u1").await.unwrap().unwrap(), progress);

        repo.delete("u1").await.unwrap();
        assert!(repo.get("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mail_and_analytics_are_appended() {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        let mail = MailQueue::new(Arc::clone(&store));
        let analytics = AnalyticsRepository::new(Arc::clone(&store));

        mail.enqueue(&MailMessage::template("a@example.com", "welcome"))
            .await
            .unwrap();
        analytics
            .record(&AnalyticsEvent::new("welcome_email_sent", "u1"))
            .await
            .unwrap();

        assert_eq!(mail.list().await.unwrap()[0].template.name, "welcome");
        assert_eq!(analytics.list().await.unwrap()[0].event, "welcome_email_sent");
    }

    #[test]
    fn test_to_fields_rejects_scalars() {
        assert!(to_fields(&5).is_err());
    }
}
