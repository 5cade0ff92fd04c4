//! Request handlers.

pub mod applications;
pub mod auth;
pub mod companies;
pub mod health;
pub mod jobs;
pub mod registration;

pub use health::*;
