//! Firestore REST API client.
//!
//! Talks to production Firestore with service-account credentials, or to the
//! local emulator when `FIRESTORE_EMULATOR_HOST` is set. Every call runs in a
//! tracing span and records request metrics. Failed calls are reported as
//! they are; nothing is retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use gcp_auth::{CustomServiceAccount, TokenProvider};
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, info_span, Instrument};

use crate::error::{FirestoreError, FirestoreResult};
use crate::metrics::{record_listed, record_request};
use crate::store::{DocumentStore, Fields};
use crate::token_cache::TokenCache;
use crate::types::{Document, ListDocumentsResponse, Value};

/// Project used against the emulator when none is configured.
const EMULATOR_DEFAULT_PROJECT: &str = "demo-recruiterhub";

/// Page size used when listing whole collections.
const LIST_PAGE_SIZE: u32 = 300;

// =============================================================================
// Configuration
// =============================================================================

/// Firestore client configuration.
#[derive(Debug, Clone)]
pub struct FirestoreConfig {
    /// GCP project ID
    pub project_id: String,
    /// Database ID (usually "(default)")
    pub database_id: String,
    /// Request timeout
    pub timeout: Duration,
    /// Connect timeout
    pub connect_timeout: Duration,
    /// `host:port` of the Firestore emulator, if used
    pub emulator_host: Option<String>,
}

impl FirestoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        let emulator_host = std::env::var("FIRESTORE_EMULATOR_HOST")
            .ok()
            .filter(|h| !h.is_empty());

        let project_id = std::env::var("FIREBASE_PROJECT_ID")
            .or_else(|_| std::env::var("GCP_PROJECT_ID"))
            .ok()
            .filter(|p| !p.is_empty());

        let project_id = match (project_id, &emulator_host) {
            (Some(p), _) => p,
            (None, Some(_)) => EMULATOR_DEFAULT_PROJECT.to_string(),
            (None, None) => {
                return Err(FirestoreError::config(
                    "FIREBASE_PROJECT_ID or GCP_PROJECT_ID must be set to access Firestore",
                ))
            }
        };

        let timeout_secs: u64 = std::env::var("FIRESTORE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(30);

        let connect_timeout_secs: u64 = std::env::var("FIRESTORE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5);

        Ok(Self {
            project_id,
            database_id: std::env::var("FIRESTORE_DATABASE_ID")
                .unwrap_or_else(|_| "(default)".to_string()),
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            emulator_host,
        })
    }

    /// Config pointing at an emulator, used by local tooling and tests.
    pub fn emulator(host: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            database_id: "(default)".to_string(),
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(2),
            emulator_host: Some(host.into()),
        }
    }
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
enum Auth {
    /// The emulator accepts any bearer token; `owner` bypasses security rules.
    Emulator,
    ServiceAccount(Arc<TokenCache>),
}

/// Firestore REST API client.
#[derive(Clone)]
pub struct FirestoreClient {
    http: Client,
    config: FirestoreConfig,
    base_url: String,
    auth: Auth,
}

impl FirestoreClient {
    /// Create a new Firestore client.
    pub fn new(config: FirestoreConfig) -> FirestoreResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(10)
            .user_agent(concat!("rhub-firestore/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FirestoreError::Network)?;

        let (base_url, auth) = match &config.emulator_host {
            Some(host) => (
                format!(
                    "http://{}/v1/projects/{}/databases/{}/documents",
                    host, config.project_id, config.database_id
                ),
                Auth::Emulator,
            ),
            None => (
                format!(
                    "https://firestore.googleapis.com/v1/projects/{}/databases/{}/documents",
                    config.project_id, config.database_id
                ),
                Auth::ServiceAccount(Arc::new(TokenCache::new(Self::create_auth_provider()?))),
            ),
        };

        Ok(Self {
            http,
            config,
            base_url,
            auth,
        })
    }

    fn create_auth_provider() -> FirestoreResult<Arc<dyn TokenProvider>> {
        let service_account = CustomServiceAccount::from_env().map_err(|e| {
            FirestoreError::auth_error(format!("Failed to load service account: {}", e))
        })?;

        match service_account {
            Some(sa) => Ok(Arc::new(sa)),
            None => Err(FirestoreError::auth_error(
                "GOOGLE_APPLICATION_CREDENTIALS not set. \
                 Set it to the path of your service account JSON file, \
                 or set FIRESTORE_EMULATOR_HOST for local development.",
            )),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> FirestoreResult<Self> {
        Self::new(FirestoreConfig::from_env()?)
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    pub fn is_emulator(&self) -> bool {
        matches!(self.auth, Auth::Emulator)
    }

    async fn authorize(&self, request: RequestBuilder) -> FirestoreResult<RequestBuilder> {
        match &self.auth {
            Auth::Emulator => Ok(request.bearer_auth("owner")),
            Auth::ServiceAccount(cache) => Ok(request.bearer_auth(cache.get_token().await?)),
        }
    }

    /// Send a request, mapping auth failures. An expired token is dropped so
    /// the next call fetches a new one.
    async fn send(&self, request: RequestBuilder, url: &str) -> FirestoreResult<reqwest::Response> {
        let response = self.authorize(request).await?.send().await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            if let Auth::ServiceAccount(cache) = &self.auth {
                cache.invalidate().await;
            }
            return Err(Self::handle_error_response(StatusCode::UNAUTHORIZED, url, response).await);
        }
        Ok(response)
    }

    /// Build document path.
    fn document_path(&self, collection: &str, doc_id: &str) -> String {
        format!("{}/{}/{}", self.base_url, collection, doc_id)
    }

    // =========================================================================
    // CRUD Operations
    // =========================================================================

    /// Get a document.
    pub async fn get_document(
        &self,
        collection: &str,
        doc_id: &str,
    ) -> FirestoreResult<Option<Document>> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("get_document", collection, Some(doc_id), async {
            let response = self.send(self.http.get(&url), &url).await?;
            match response.status() {
                StatusCode::OK => Ok(Some(response.json().await?)),
                StatusCode::NOT_FOUND => Ok(None),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Create a document. Without an id, Firestore generates one.
    pub async fn create_document(
        &self,
        collection: &str,
        doc_id: Option<&str>,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = match doc_id {
            Some(id) => format!(
                "{}/{}?documentId={}",
                self.base_url,
                collection,
                urlencoding::encode(id)
            ),
            None => format!("{}/{}", self.base_url, collection),
        };
        let body = Document::new(fields);

        self.execute_request("create_document", collection, doc_id, async {
            let response = self.send(self.http.post(&url).json(&body), &url).await?;
            match response.status() {
                StatusCode::OK | StatusCode::CREATED => Ok(response.json().await?),
                StatusCode::CONFLICT => Err(FirestoreError::AlreadyExists(format!(
                    "{}/{}",
                    collection,
                    doc_id.unwrap_or_default()
                ))),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Write a document, creating it if missing and replacing all fields otherwise.
    pub async fn set_document(
        &self,
        collection: &str,
        doc_id: &str,
        fields: HashMap<String, Value>,
    ) -> FirestoreResult<Document> {
        let url = self.document_path(collection, doc_id);
        let body = Document::new(fields);

        self.execute_request("set_document", collection, Some(doc_id), async {
            let response = self.send(self.http.patch(&url).json(&body), &url).await?;
            match response.status() {
                StatusCode::OK => Ok(response.json().await?),
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// Delete a document.
    pub async fn delete_document(&self, collection: &str, doc_id: &str) -> FirestoreResult<()> {
        let url = self.document_path(collection, doc_id);

        self.execute_request("delete_document", collection, Some(doc_id), async {
            let response = self.send(self.http.delete(&url), &url).await?;
            match response.status() {
                StatusCode::OK | StatusCode::NO_CONTENT => Ok(()),
                StatusCode::NOT_FOUND => {
                    debug!("Document {}/{} already deleted", collection, doc_id);
                    Ok(())
                }
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    /// List one page of documents in a collection.
    pub async fn list_documents(
        &self,
        collection: &str,
        page_size: Option<u32>,
        page_token: Option<&str>,
    ) -> FirestoreResult<ListDocumentsResponse> {
        let mut url = format!("{}/{}", self.base_url, collection);
        let mut params = Vec::new();
        if let Some(size) = page_size {
            params.push(format!("pageSize={}", size));
        }
        if let Some(token) = page_token {
            params.push(format!("pageToken={}", urlencoding::encode(token)));
        }
        if !params.is_empty() {
            url = format!("{}?{}", url, params.join("&"));
        }

        self.execute_request("list_documents", collection, None, async {
            let response = self.send(self.http.get(&url), &url).await?;
            match response.status() {
                StatusCode::OK => {
                    let list: ListDocumentsResponse = response.json().await?;
                    record_listed(collection, list.documents.as_ref().map(|d| d.len()).unwrap_or(0));
                    Ok(list)
                }
                status => Err(Self::handle_error_response(status, &url, response).await),
            }
        })
        .await
    }

    // =========================================================================
    // Internal Helpers
    // =========================================================================

    /// Execute a request with tracing and metrics.
    async fn execute_request<T, F>(
        &self,
        operation: &str,
        collection: &str,
        doc_id: Option<&str>,
        fut: F,
    ) -> FirestoreResult<T>
    where
        F: std::future::Future<Output = FirestoreResult<T>>,
    {
        let span = if let Some(id) = doc_id {
            info_span!("firestore_request", operation = %operation, collection = %collection, doc_id = %id)
        } else {
            info_span!("firestore_request", operation = %operation, collection = %collection)
        };

        let start = Instant::now();
        let result = fut.instrument(span).await;
        let latency_ms = start.elapsed().as_millis() as f64;

        let status = match &result {
            Ok(_) => 200,
            Err(e) => e.http_status().unwrap_or(500),
        };
        record_request(operation, status, latency_ms);

        result
    }

    async fn handle_error_response(
        status: StatusCode,
        url: &str,
        response: reqwest::Response,
    ) -> FirestoreError {
        let body = response.text().await.unwrap_or_default();
        FirestoreError::from_http_status(status.as_u16(), format!("{} failed: {}", url, body))
    }
}

#[async_trait]
impl DocumentStore for FirestoreClient {
    async fn get(&self, collection: &str, id: &str) -> FirestoreResult<Option<Fields>> {
        Ok(self
            .get_document(collection, id)
            .await?
            .map(|doc| doc.to_json()))
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> FirestoreResult<()> {
        let body = Document::from_json(&fields);
        self.set_document(collection, id, body.fields.unwrap_or_default())
            .await?;
        Ok(())
    }

    async fn add(&self, collection: &str, fields: Fields) -> FirestoreResult<String> {
        let body = Document::from_json(&fields);
        let doc = self
            .create_document(collection, None, body.fields.unwrap_or_default())
            .await?;
        doc.id()
            .map(str::to_string)
            .ok_or_else(|| FirestoreError::InvalidResponse("created document has no name".to_string()))
    }

    async fn delete(&self, collection: &str, id: &str) -> FirestoreResult<()> {
        self.delete_document(collection, id).await
    }

    async fn list(&self, collection: &str) -> FirestoreResult<Vec<(String, Fields)>> {
        let mut out = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let page = self
                .list_documents(collection, Some(LIST_PAGE_SIZE), page_token.as_deref())
                .await?;
            for doc in page.documents.unwrap_or_default() {
                if let Some(id) = doc.id() {
                    out.push((id.to_string(), doc.to_json()));
                }
            }
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(out)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use serial_test::serial;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DOCS: &str = "/v1/projects/test-project/databases/(default)/documents";

    async fn client(server: &MockServer) -> FirestoreClient {
        FirestoreClient::new(FirestoreConfig::emulator(
            server.address().to_string(),
            "test-project",
        ))
        .unwrap()
    }

    fn doc_json(collection: &str, id: &str, fields: serde_json::Value) -> serde_json::Value {
        json!({
            "name": format!("projects/test-project/databases/(default)/documents/{}/{}", collection, id),
            "fields": fields,
            "createTime": "2024-01-01T00:00:00Z",
            "updateTime": "2024-01-01T00:00:00Z"
        })
    }

    #[test]
    #[serial]
    fn test_config_requires_project_without_emulator() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("FIREBASE_PROJECT_ID");
        std::env::remove_var("FIRESTORE_EMULATOR_HOST");
        assert!(FirestoreConfig::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_config_emulator_defaults_project() {
        std::env::remove_var("GCP_PROJECT_ID");
        std::env::remove_var("FIREBASE_PROJECT_ID");
        std::env::set_var("FIRESTORE_EMULATOR_HOST", "127.0.0.1:8080");
        let config = FirestoreConfig::from_env().unwrap();
        assert_eq!(config.project_id, EMULATOR_DEFAULT_PROJECT);
        assert_eq!(config.emulator_host.as_deref(), Some("127.0.0.1:8080"));
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
        std::env::remove_var("FIRESTORE_EMULATOR_HOST");
    }

    #[tokio::test]
    async fn test_get_missing_document_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/registrationProgress/u1", DOCS)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server).await;
        assert!(client.get("registrationProgress", "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_get_document_converts_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/registrationProgress/u1", DOCS)))
            .and(header("authorization", "Bearer owner"))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc_json(
                "registrationProgress",
                "u1",
                json!({
                    "currentStep": { "integerValue": "3" },
                    "uid": { "stringValue": "u1" }
                }),
            )))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let fields = client.get("registrationProgress", "u1").await.unwrap().unwrap();
        assert_eq!(fields["currentStep"], json!(3));
        assert_eq!(fields["uid"], json!("u1"));
    }

    #[tokio::test]
    async fn test_set_patches_document() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(format!("{}/registrationProgress/u1", DOCS)))
            .and(body_partial_json(json!({
                "fields": { "completed": { "booleanValue": true } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc_json(
                "registrationProgress",
                "u1",
                json!({ "completed": { "booleanValue": true } }),
            )))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let fields = json!({ "completed": true }).as_object().cloned().unwrap();
        client.set("registrationProgress", "u1", fields).await.unwrap();
    }

    #[tokio::test]
    async fn test_add_returns_generated_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("{}/mail", DOCS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(doc_json(
                "mail",
                "generated123",
                json!({ "to": { "stringValue": "a@example.com" } }),
            )))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let fields = json!({ "to": "a@example.com" }).as_object().cloned().unwrap();
        assert_eq!(client.add("mail", fields).await.unwrap(), "generated123");
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(format!("{}/registrationProgress/gone", DOCS)))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client(&server).await;
        client.delete("registrationProgress", "gone").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_follows_page_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/analytics", DOCS)))
            .and(query_param("pageToken", "next"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [doc_json("analytics", "b", json!({}))]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("{}/analytics", DOCS)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "documents": [doc_json("analytics", "a", json!({}))],
                "nextPageToken": "next"
            })))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let ids: Vec<String> = client
            .list("analytics")
            .await
            .unwrap()
            .into_iter()
            .map(|(id, _)| id)
            .collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("{}/mail/x", DOCS)))
            .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server).await;
        let err = client.get("mail", "x").await.unwrap_err();
        assert!(matches!(err, FirestoreError::ServerError(503, _)));
    }
}
