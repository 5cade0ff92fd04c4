//! API routes.

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::applications::{create_application, list_applications};
use crate::handlers::auth::{create_session, logout, me, register};
use crate::handlers::companies::{create_company, get_company, my_company};
use crate::handlers::jobs::{create_job, get_job, list_jobs, posted_jobs};
use crate::handlers::registration::{complete, get_progress, go_back, start_mfa, submit_step, verify_mfa};
use crate::handlers::{health, ready};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, rate_limit_middleware, request_id, request_logging, security_headers, RateLimiterCache};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let auth_routes = Router::new()
        .route("/auth/me", get(me))
        .route("/auth/register", post(register))
        // Exchange an identity-provider ID token for a session cookie
        .route("/auth/session", post(create_session))
        .route("/auth/logout", post(logout));

    let job_routes = Router::new()
        .route("/jobs", get(list_jobs).post(create_job))
        .route("/jobs/posted", get(posted_jobs))
        .route("/jobs/:id", get(get_job));

    let application_routes = Router::new()
        .route("/applications", get(list_applications).post(create_application));

    let company_routes = Router::new()
        .route("/companies", post(create_company))
        .route("/companies/mine", get(my_company))
        .route("/companies/:id", get(get_company));

    // Registration wizard (ID token auth)
    let registration_routes = Router::new()
        .route("/registration", get(get_progress))
        .route("/registration/steps", post(submit_step))
        .route("/registration/back", post(go_back))
        .route("/registration/mfa/start", post(start_mfa))
        .route("/registration/mfa/verify", post(verify_mfa))
        .route("/registration/complete", post(complete));

    let rate_limiter = Arc::new(RateLimiterCache::new(state.config.rate_limit_rps));

    let api_routes = Router::new()
        .merge(auth_routes)
        .merge(job_routes)
        .merge(application_routes)
        .merge(company_routes)
        .merge(registration_routes)
        .layer(middleware::from_fn_with_state(rate_limiter, rate_limit_middleware));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
