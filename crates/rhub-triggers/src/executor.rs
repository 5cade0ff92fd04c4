//! Trigger executor.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use rhub_firestore::{collections, AnalyticsRepository, DocumentStore, MailQueue, ProgressRepository};
use rhub_identity::IdentityProvider;

use crate::config::TriggerConfig;
use crate::error::TriggerResult;
use crate::event::TriggerEvent;
use crate::handlers;
use crate::metrics;

/// Dependencies shared by all handlers.
///
/// The document store given here must not be a [`crate::TriggeringStore`]
/// feeding the same bus, or handler writes would be published again.
pub struct TriggerContext {
    pub config: TriggerConfig,
    pub mail: MailQueue,
    pub analytics: AnalyticsRepository,
    pub progress: ProgressRepository,
    pub identity: Arc<dyn IdentityProvider>,
}

impl TriggerContext {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        config: TriggerConfig,
    ) -> Self {
        Self {
            config,
            mail: MailQueue::new(Arc::clone(&store)),
            analytics: AnalyticsRepository::new(Arc::clone(&store)),
            progress: ProgressRepository::new(store),
            identity,
        }
    }
}

/// Consumes the event bus and runs the matching handler for each event,
/// one at a time, in publish order.
pub struct TriggerExecutor {
    ctx: Arc<TriggerContext>,
    shutdown: watch::Sender<bool>,
}

impl TriggerExecutor {
    pub fn new(ctx: Arc<TriggerContext>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self { ctx, shutdown }
    }

    /// Run until shutdown is signalled or every bus sender is dropped.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<TriggerEvent>) {
        info!("Starting trigger executor");
        let mut shutdown_rx = self.shutdown.subscribe();

        loop {
            if *shutdown_rx.borrow_and_update() {
                info!("Shutdown signal received, draining trigger events");
                break;
            }
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                event = rx.recv() => {
                    match event {
                        Some(event) => self.handle(event).await,
                        None => {
                            info!("Event bus closed");
                            return;
                        }
                    }
                }
            }
        }

        let drain = async {
            while let Ok(event) = rx.try_recv() {
                self.handle(event).await;
            }
        };
        if tokio::time::timeout(self.ctx.config.shutdown_timeout, drain)
            .await
            .is_err()
        {
            warn!("Timed out draining trigger events");
        }
        info!("Trigger executor stopped");
    }

    /// Run on a background task.
    pub fn spawn(self: Arc<Self>, rx: mpsc::UnboundedReceiver<TriggerEvent>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(rx).await })
    }

    /// Signal shutdown.
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    /// Run the handler for one event. Failures are logged and counted.
    pub async fn handle(&self, event: TriggerEvent) {
        let (trigger, result) = self.dispatch(event).await;
        let Some(trigger) = trigger else {
            return;
        };
        match result {
            Ok(()) => metrics::record_run(trigger, "success"),
            Err(e) => {
                metrics::record_run(trigger, "error");
                error!(trigger, "Trigger failed: {}", e);
            }
        }
    }

    async fn dispatch(&self, event: TriggerEvent) -> (Option<&'static str>, TriggerResult<()>) {
        match event {
            TriggerEvent::UserCreated(user) => (
                Some("send_welcome_email"),
                handlers::send_welcome_email(&self.ctx, &user).await,
            ),
            TriggerEvent::IdentityUpdated { before, after } => (
                Some("track_mfa_enrollment"),
                handlers::track_mfa_enrollment(&self.ctx, &before, &after).await,
            ),
            TriggerEvent::DocumentWritten {
                collection,
                doc_id,
                before,
                after,
            } if collection == collections::REGISTRATION_PROGRESS => (
                Some("on_registration_complete"),
                handlers::on_registration_complete(&self.ctx, &doc_id, before.as_ref(), after.as_ref())
                    .await
                    .map(|_| ()),
            ),
            TriggerEvent::DocumentWritten { collection, .. } => {
                debug!(collection = %collection, "No trigger for collection");
                (None, Ok(()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rhub_firestore::MemoryDocumentStore;
    use rhub_identity::{IdentityUser, MemoryIdentityProvider};

    use crate::event::EventBus;

    fn context() -> Arc<TriggerContext> {
        let store: Arc<dyn DocumentStore> = Arc::new(MemoryDocumentStore::new());
        Arc::new(TriggerContext::new(
            store,
            Arc::new(MemoryIdentityProvider::new()),
            TriggerConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_executor_runs_until_bus_closed() {
        let ctx = context();
        let executor = TriggerExecutor::new(Arc::clone(&ctx));
        let (bus, rx) = EventBus::new();

        bus.publish(TriggerEvent::UserCreated(IdentityUser {
            uid: "u1".to_string(),
            email: Some("a@example.com".to_string()),
            ..Default::default()
        }))
        .unwrap();
        drop(bus);

        executor.run(rx).await;
        assert_eq!(ctx.mail.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_shutdown_drains_queued_events() {
        let ctx = context();
        let executor = Arc::new(TriggerExecutor::new(Arc::clone(&ctx)));
        let (bus, rx) = EventBus::new();

        executor.shutdown();
        for uid in ["u1", "u2"] {
            bus.publish(TriggerEvent::UserCreated(IdentityUser {
                uid: uid.to_string(),
                email: Some(format!("{}@example.com", uid)),
                ..Default::default()
            }))
            .unwrap();
        }

        Arc::clone(&executor).spawn(rx).await.unwrap();
        assert_eq!(ctx.analytics.list().await.unwrap().len(), 2);
    }
}
