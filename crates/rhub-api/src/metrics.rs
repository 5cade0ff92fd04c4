//! Prometheus metrics for the API server.

use std::sync::LazyLock;
use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use regex::Regex;

/// Install the Prometheus recorder and return the handle that renders it.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "rhub_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "rhub_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "rhub_http_requests_in_flight";

    // Rate limiting metrics
    pub const RATE_LIMIT_HITS_TOTAL: &str = "rhub_rate_limit_hits_total";

    // Domain metrics
    pub const SESSIONS_CREATED_TOTAL: &str = "rhub_sessions_created_total";
    pub const WIZARD_TRANSITIONS_TOTAL: &str = "rhub_wizard_transitions_total";
    pub const REGISTRATIONS_COMPLETED_TOTAL: &str = "rhub_registrations_completed_total";
}

static NUMERIC_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[0-9]+(/|$)").expect("valid regex"));

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

pub fn record_session_created() {
    counter!(names::SESSIONS_CREATED_TOTAL).increment(1);
}

/// Record a wizard move to `step` via `action` (submit, back, mfa).
pub fn record_wizard_transition(action: &str, step: &str) {
    let labels = [("action", action.to_string()), ("step", step.to_string())];
    counter!(names::WIZARD_TRANSITIONS_TOTAL, &labels).increment(1);
}

pub fn record_registration_completed(role: &str) {
    let labels = [("role", role.to_string())];
    counter!(names::REGISTRATIONS_COMPLETED_TOTAL, &labels).increment(1);
}

/// Replace numeric ids so paths make bounded label sets.
fn sanitize_path(path: &str) -> String {
    NUMERIC_SEGMENT.replace_all(path, "/:id$1").to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path() {
        assert_eq!(sanitize_path("/api/jobs/42"), "/api/jobs/:id");
        assert_eq!(sanitize_path("/api/companies/7/"), "/api/companies/:id/");
        assert_eq!(sanitize_path("/api/jobs/posted"), "/api/jobs/posted");
    }
}
