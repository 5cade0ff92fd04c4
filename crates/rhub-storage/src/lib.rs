//! Storage facade for the job board entities.
//!
//! This crate provides:
//! - The `Storage` trait every persistence backend implements
//! - `MemStorage`, an in-process backend with sequential ids

pub mod error;
pub mod memory;
pub mod traits;

pub use error::{StorageError, StorageResult};
pub use memory::MemStorage;
pub use traits::Storage;
