//! Document store abstraction.

use async_trait::async_trait;

use crate::error::FirestoreResult;

/// Document body as a JSON object.
pub type Fields = serde_json::Map<String, serde_json::Value>;

/// Minimal document database: collections of JSON documents keyed by id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read a document. Missing documents are `Ok(None)`.
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Fields>>;

    /// Create or fully replace a document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<()>;

    /// Create a document with a generated id and return that id.
    async fn add(&self, collection: &str, fields: Fields) -> FirestoreResult<String>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()>;

    /// All documents in a collection as `(id, fields)` pairs.
    async fn list(&self, collection: &str) -> FirestoreResult<Vec<(String, Fields)>>;
}
