//! Metric definitions for the request pipeline
//!
//! The library only emits through the `metrics` facade; installing a
//! recorder/exporter is left to the embedding application.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

pub const REQUESTS_TOTAL: &str = "erp_client_requests_total";
pub const REQUEST_DURATION_SECONDS: &str = "erp_client_request_duration_seconds";
pub const RETRIES_TOTAL: &str = "erp_client_retries_total";
pub const TRANSPORT_FAILURES_TOTAL: &str = "erp_client_transport_failures_total";
pub const SESSION_EXPIRED_TOTAL: &str = "erp_client_session_expired_total";

/// Register metric descriptions with the installed recorder.
pub fn describe_metrics() {
    describe_counter!(REQUESTS_TOTAL, "Total number of pipeline requests by method and outcome");
    describe_histogram!(
        REQUEST_DURATION_SECONDS,
        "Pipeline request duration in seconds, retries included"
    );
    describe_counter!(RETRIES_TOTAL, "Transport-level retries performed");
    describe_counter!(
        TRANSPORT_FAILURES_TOTAL,
        "Transport failures observed, retried or not"
    );
    describe_counter!(
        SESSION_EXPIRED_TOTAL,
        "401 responses that cleared the stored token"
    );
}

pub fn record_request(method: &str, outcome: String, elapsed: Duration) {
    counter!(REQUESTS_TOTAL, "method" => method.to_string(), "outcome" => outcome).increment(1);
    histogram!(REQUEST_DURATION_SECONDS, "method" => method.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_transport_failure(kind: &'static str) {
    counter!(TRANSPORT_FAILURES_TOTAL, "kind" => kind).increment(1);
}

pub fn record_retry() {
    counter!(RETRIES_TOTAL).increment(1);
}

pub fn record_session_expired() {
    counter!(SESSION_EXPIRED_TOTAL).increment(1);
}
