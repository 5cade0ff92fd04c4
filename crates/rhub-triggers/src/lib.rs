//! Lifecycle triggers.
//!
//! Side effects that follow account and document changes:
//! - welcome mail when an account is created
//! - MFA analytics and mail when a first factor is enrolled
//! - analytics, mail and delayed cleanup when registration completes
//!
//! Events are published on an [`EventBus`] and handled in order by a
//! [`TriggerExecutor`] running on a background task. [`TriggeringStore`]
//! wraps a document store and publishes its writes.

pub mod config;
pub mod error;
pub mod event;
pub mod executor;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod store;

pub use config::TriggerConfig;
pub use error::{TriggerError, TriggerResult};
pub use event::{EventBus, TriggerEvent};
pub use executor::{TriggerContext, TriggerExecutor};
pub use logging::TriggerLogger;
pub use store::TriggeringStore;
