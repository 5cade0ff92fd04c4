//! Identity provider integration.
//!
//! This crate provides:
//! - The `IdentityProvider` trait: ID token verification, user lookup and
//!   phone-based MFA enrollment
//! - `FirebaseIdentityClient`, backed by the Identity Toolkit REST API
//!   (production or the local auth emulator)
//! - `MemoryIdentityProvider` for development and tests

pub mod client;
pub mod error;
pub mod jwks;
pub mod memory;
pub mod provider;
pub mod types;

pub use client::{FirebaseIdentityClient, IdentityConfig};
pub use error::{IdentityError, IdentityResult};
pub use memory::MemoryIdentityProvider;
pub use provider::IdentityProvider;
pub use types::{EnrolledFactor, IdentityClaims, IdentityUser};
