//! Document store decorator that publishes writes as trigger events.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use rhub_firestore::{DocumentStore, Fields, FirestoreResult};

use crate::event::{EventBus, TriggerEvent};

/// Wraps a [`DocumentStore`] and publishes a [`TriggerEvent::DocumentWritten`]
/// for every write to a watched collection.
///
/// The `before` snapshot is read just ahead of the write. Publishing
/// failures are logged and never fail the write itself.
pub struct TriggeringStore {
    inner: Arc<dyn DocumentStore>,
    bus: EventBus,
    watched: HashSet<String>,
}

impl TriggeringStore {
    pub fn new(inner: Arc<dyn DocumentStore>, bus: EventBus, watched: &[&str]) -> Self {
        Self {
            inner,
            bus,
            watched: watched.iter().map(|c| c.to_string()).collect(),
        }
    }

    fn is_watched(&self, collection: &str) -> bool {
        self.watched.contains(collection)
    }

    fn publish(&self, collection: &str, doc_id: &str, before: Option<Fields>, after: Option<Fields>) {
        let event = TriggerEvent::DocumentWritten {
            collection: collection.to_string(),
            doc_id: doc_id.to_string(),
            before,
            after,
        };
        if let Err(e) = self.bus.publish(event) {
            warn!(collection, doc_id, "Failed to publish document write: {}", e);
        }
    }
}

#[async_trait]
impl DocumentStore for TriggeringStore {
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Fields>> {
        self.inner.get(collection, id).await
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<()> {
        if !self.is_watched(collection) {
            return self.inner.set(collection, id, fields).await;
        }
        let before = self.inner.get(collection, id).await?;
        self.inner.set(collection, id, fields.clone()).await?;
        self.publish(collection, id, before, Some(fields));
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> FirestoreResult<String> {
        if !self.is_watched(collection) {
            return self.inner.add(collection, fields).await;
        }
        let id = self.inner.add(collection, fields.clone()).await?;
        self.publish(collection, &id, None, Some(fields));
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()> {
        if !self.is_watched(collection) {
            return self.inner.delete(collection, id).await;
        }
        let before = self.inner.get(collection, id).await?;
        self.inner.delete(collection, id).await?;
        if before.is_some() {
            self.publish(collection, id, before, None);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> FirestoreResult<Vec<(String, Fields)>> {
        self.inner.list(collection).await
    }
}
