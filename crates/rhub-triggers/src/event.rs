//! Trigger events and the in-process bus that carries them.

use tokio::sync::mpsc;
use tracing::debug;

use rhub_firestore::Fields;
use rhub_identity::IdentityUser;

use crate::error::{TriggerError, TriggerResult};
use crate::metrics;

/// Something happened that triggers may react to.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerEvent {
    /// A new account exists.
    UserCreated(IdentityUser),
    /// An account changed at the identity provider, e.g. after sign-in
    /// with a newly enrolled second factor.
    IdentityUpdated {
        before: IdentityUser,
        after: IdentityUser,
    },
    /// A document was created, replaced or deleted.
    DocumentWritten {
        collection: String,
        doc_id: String,
        before: Option<Fields>,
        after: Option<Fields>,
    },
}

impl TriggerEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            TriggerEvent::UserCreated(_) => "user_created",
            TriggerEvent::IdentityUpdated { .. } => "identity_updated",
            TriggerEvent::DocumentWritten { .. } => "document_written",
        }
    }
}

/// Sending half of the trigger channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: mpsc::UnboundedSender<TriggerEvent>,
}

impl EventBus {
    /// Create a bus and the receiver to hand to a [`crate::TriggerExecutor`].
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TriggerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn publish(&self, event: TriggerEvent) -> TriggerResult<()> {
        let kind = event.kind();
        self.tx.send(event).map_err(|_| TriggerError::BusClosed)?;
        metrics::record_published(kind);
        debug!(kind, "Published trigger event");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_events_delivered_in_order() {
        let (bus, mut rx) = EventBus::new();
        let user = IdentityUser {
            uid: "u1".to_string(),
            ..Default::default()
        };
        bus.publish(TriggerEvent::UserCreated(user.clone())).unwrap();
        bus.publish(TriggerEvent::IdentityUpdated {
            before: user.clone(),
            after: user,
        })
        .unwrap();

        assert_eq!(rx.recv().await.unwrap().kind(), "user_created");
        assert_eq!(rx.recv().await.unwrap().kind(), "identity_updated");
    }

    #[test]
    fn test_publish_after_receiver_dropped() {
        let (bus, rx) = EventBus::new();
        drop(rx);
        let err = bus
            .publish(TriggerEvent::UserCreated(IdentityUser::default()))
            .unwrap_err();
        assert!(matches!(err, TriggerError::BusClosed));
    }
}
