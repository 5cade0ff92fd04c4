//! Trigger metrics.

use metrics::counter;

/// Metric name constants for consistency.
pub mod names {
    /// Events handled, by trigger and outcome.
    pub const TRIGGER_RUNS_TOTAL: &str = "rhub_trigger_runs_total";

    /// Events published on the bus, by kind.
    pub const EVENTS_PUBLISHED_TOTAL: &str = "rhub_trigger_events_published_total";

    /// Registration progress documents removed by delayed cleanup.
    pub const CLEANUPS_TOTAL: &str = "rhub_trigger_cleanups_total";
}

pub fn record_run(trigger: &str, outcome: &str) {
    counter!(
        names::TRIGGER_RUNS_TOTAL,
        "trigger" => trigger.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_published(kind: &str) {
    counter!(names::EVENTS_PUBLISHED_TOTAL, "kind" => kind.to_string()).increment(1);
}

pub fn record_cleanup() {
    counter!(names::CLEANUPS_TOTAL).increment(1);
}
