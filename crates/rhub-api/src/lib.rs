//! Axum HTTP API server.
//!
//! This crate provides:
//! - REST endpoints for accounts, jobs, applications and companies
//! - The multi-step registration wizard backed by the document store
//! - Signed session cookies and identity-provider ID token verification
//! - Rate limiting, security headers and Prometheus metrics

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::WizardService;
pub use session::{SessionStore, SessionUser, SESSION_COOKIE};
pub use state::{AppState, Triggers};
