//! Firestore-shaped document store.
//!
//! This crate provides:
//! - The `DocumentStore` trait used for wizard progress and trigger output
//! - A Firestore REST client (production or local emulator)
//! - An in-memory store for development and tests
//! - Typed repositories for registration progress, mail and analytics

pub mod client;
pub mod error;
pub mod memory;
pub mod metrics;
pub mod repos;
pub mod store;
pub mod token_cache;
pub mod types;

pub use client::{FirestoreClient, FirestoreConfig};
pub use error::{FirestoreError, FirestoreResult};
pub use memory::MemoryDocumentStore;
pub use repos::{collections, AnalyticsRepository, MailQueue, ProgressRepository};
pub use store::{DocumentStore, Fields};
pub use types::{Document, Value};
