//! Application state.

use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use uuid::Uuid;

use rhub_firestore::{collections, DocumentStore, FirestoreClient, MemoryDocumentStore};
use rhub_identity::{FirebaseIdentityClient, IdentityProvider, MemoryIdentityProvider};
use rhub_storage::{MemStorage, Storage};
use rhub_triggers::{
    EventBus, TriggerConfig, TriggerContext, TriggerEvent, TriggerExecutor, TriggeringStore,
};

use crate::config::{ApiConfig, DocumentStoreKind, IdentityProviderKind};
use crate::services::WizardService;
use crate::session::SessionStore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub storage: Arc<dyn Storage>,
    /// Document store whose watched writes are published to the triggers.
    pub documents: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub sessions: Arc<SessionStore>,
    pub events: EventBus,
    pub wizard: WizardService,
}

/// The trigger executor and its event feed, ready to be spawned.
pub struct Triggers {
    pub executor: Arc<TriggerExecutor>,
    receiver: mpsc::UnboundedReceiver<TriggerEvent>,
}

impl Triggers {
    /// Run the executor on a background task.
    pub fn spawn(self) -> JoinHandle<()> {
        self.executor.spawn(self.receiver)
    }
}

impl AppState {
    /// Build the state and its backends from configuration.
    pub async fn new(config: ApiConfig) -> anyhow::Result<(Self, Triggers)> {
        let documents: Arc<dyn DocumentStore> = match config.document_store {
            DocumentStoreKind::Memory => {
                info!("Using in-memory document store");
                Arc::new(MemoryDocumentStore::new())
            }
            DocumentStoreKind::Firestore => Arc::new(
                FirestoreClient::from_env().context("Failed to create Firestore client")?,
            ),
        };

        let identity: Arc<dyn IdentityProvider> = match config.identity_provider {
            IdentityProviderKind::Memory => {
                warn!("Using in-memory identity provider; ID tokens cannot be issued from outside the process");
                Arc::new(MemoryIdentityProvider::new())
            }
            IdentityProviderKind::Firebase => Arc::new(
                FirebaseIdentityClient::from_env()
                    .await
                    .context("Failed to create identity client")?,
            ),
        };

        if config.session_secret.is_none() && config.is_production() {
            anyhow::bail!("SESSION_SECRET must be set in production");
        }

        Ok(Self::assemble(
            config,
            Arc::new(MemStorage::new()),
            documents,
            identity,
            TriggerConfig::from_env(),
        ))
    }

    /// Wire the state around already-built backends.
    ///
    /// `documents` is the raw store: handlers see it through a
    /// [`TriggeringStore`] while trigger handlers write to it directly.
    pub fn assemble(
        config: ApiConfig,
        storage: Arc<dyn Storage>,
        documents: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        trigger_config: TriggerConfig,
    ) -> (Self, Triggers) {
        let (events, receiver) = EventBus::new();

        let watched: Arc<dyn DocumentStore> = Arc::new(TriggeringStore::new(
            Arc::clone(&documents),
            events.clone(),
            &[collections::REGISTRATION_PROGRESS],
        ));

        let context = TriggerContext::new(documents, Arc::clone(&identity), trigger_config);
        let executor = Arc::new(TriggerExecutor::new(Arc::new(context)));

        let secret = config.session_secret.clone().unwrap_or_else(|| {
            warn!("SESSION_SECRET not set, generating a per-process secret");
            Uuid::new_v4().to_string()
        });
        let sessions = Arc::new(SessionStore::new(
            secret,
            config.session_ttl,
            config.is_production(),
        ));

        let wizard = WizardService::new(
            Arc::clone(&watched),
            Arc::clone(&storage),
            Arc::clone(&identity),
            events.clone(),
        );

        let state = Self {
            config,
            storage,
            documents: watched,
            identity,
            sessions,
            events,
            wizard,
        };

        (state, Triggers { executor, receiver })
    }
}
