//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the feedrelay server:
//! - HTTP request metrics (latency, counts, errors)
//! - Poller status (collected dynamically)
//! - The poll pipeline metrics registered by the core crate

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "feedrelay_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("feedrelay_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "feedrelay_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "feedrelay_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Poller Metrics
// =============================================================================

/// Whether the poll schedule is active (1) or not (0).
pub static POLLER_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "feedrelay_poller_running",
        "Whether the feed poll schedule is active",
    )
    .unwrap()
});

/// Whether a poll cycle is running right now.
pub static CYCLE_IN_PROGRESS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "feedrelay_poll_cycle_in_progress",
        "Whether a poll cycle is currently running",
    )
    .unwrap()
});

/// Records in the processed-entry history.
pub static HISTORY_RECORDS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "feedrelay_history_records",
        "Number of records in the processed-entry history",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Poller
    registry.register(Box::new(POLLER_RUNNING.clone())).unwrap();
    registry
        .register(Box::new(CYCLE_IN_PROGRESS.clone()))
        .unwrap();
    registry
        .register(Box::new(HISTORY_RECORDS.clone()))
        .unwrap();

    // Core metrics (poll cycles, entries, dispatches)
    for metric in feedrelay_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the gauges reflect the poller and history as
/// they are now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    if let Some(scheduler) = state.scheduler() {
        let status = scheduler.status().await;
        POLLER_RUNNING.set(if status.running { 1 } else { 0 });
        CYCLE_IN_PROGRESS.set(if status.cycle_in_progress { 1 } else { 0 });
    }

    if let Ok(records) = state.history().list().await {
        HISTORY_RECORDS.set(records.len() as i64);
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();
    // History keys are display titles; anything but the clear action is a key.
    let history_regex = regex_lite::Regex::new(r"/history/(?:[^/]+)$").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    if result.ends_with("/history/clear") {
        return result.to_string();
    }
    let result = history_regex.replace_all(&result, "/history/{key}");
    result.to_string()
}
