//! Document store metrics.

use metrics::{counter, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Total document store requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "rhub_firestore_requests_total";

    /// Request latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "rhub_firestore_latency_seconds";

    /// Documents returned by list calls, by collection.
    pub const LIST_DOCUMENTS_RETURNED_TOTAL: &str = "rhub_firestore_list_documents_returned_total";
}

/// Record metrics for a completed request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

/// Record how many documents a list call returned.
pub fn record_listed(collection: &str, count: usize) {
    counter!(
        names::LIST_DOCUMENTS_RETURNED_TOTAL,
        "collection" => collection.to_string()
    )
    .increment(count as u64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::REQUESTS_TOTAL.contains("requests"));
        assert!(names::LATENCY_SECONDS.contains("latency"));
        assert!(names::LIST_DOCUMENTS_RETURNED_TOTAL.starts_with("rhub_"));
    }
}
