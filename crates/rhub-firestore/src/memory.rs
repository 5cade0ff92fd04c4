//! In-memory document store.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::FirestoreResult;
use crate::store::{DocumentStore, Fields};

/// Process-local document store used in development and tests.
#[derive(Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, BTreeMap<String, Fields>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection.
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Fields>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .and_then(|c| c.get(id))
            .cloned())
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<()> {
        self.collections
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> FirestoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.set(collection, &id, fields).await?;
        Ok(id)
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()> {
        if let Some(c) = self.collections.write().await.get_mut(collection) {
            c.remove(id);
        }
        Ok(())
    }

    async fn list(&self, collection: &str) -> FirestoreResult<Vec<(String, Fields)>> {
        Ok(self
            .collections
            .read()
            .await
            .get(collection)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryDocumentStore::new();
        assert!(store.get("c", "a").await.unwrap().is_none());

        store.set("c", "a", fields(json!({ "n": 1 }))).await.unwrap();
        assert_eq!(store.get("c", "a").await.unwrap().unwrap()["n"], json!(1));

        store.set("c", "a", fields(json!({ "m": 2 }))).await.unwrap();
        let doc = store.get("c", "a").await.unwrap().unwrap();
        assert!(doc.get("n").is_none());

        store.delete("c", "a").await.unwrap();
        store.delete("c", "a").await.unwrap();
        assert!(store.get("c", "a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_generates_distinct_ids() {
        let store = MemoryDocumentStore::new();
        let a = store.add("mail", fields(json!({ "to": "a" }))).await.unwrap();
        let b = store.add("mail", fields(json!({ "to": "b" }))).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.count("mail").await, 2);
        assert_eq!(store.list("mail").await.unwrap().len(), 2);
        assert!(store.list("other").await.unwrap().is_empty());
    }
}
