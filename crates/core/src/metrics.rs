//! Prometheus metrics for the poll pipeline.
//!
//! This module provides metrics for:
//! - Poll cycles (count, duration)
//! - Entry outcomes and dispatches
//! - Feed fetch failures

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Cycle Metrics
// =============================================================================

/// Poll cycles run.
pub static CYCLES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("feedrelay_poll_cycles_total", "Total poll cycles run").unwrap()
});

/// Poll cycle duration in seconds.
pub static CYCLE_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "feedrelay_poll_cycle_duration_seconds",
            "Duration of poll cycles",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
    )
    .unwrap()
});

// =============================================================================
// Entry Metrics
// =============================================================================

/// Feed entries processed by outcome.
pub static ENTRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("feedrelay_entries_total", "Total feed entries processed"),
        &["outcome"], // "dispatched", "skipped", "failed"
    )
    .unwrap()
});

/// Dispatches by action.
pub static DISPATCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("feedrelay_dispatches_total", "Total dispatched entries"),
        &["action"], // "subscribe", "download"
    )
    .unwrap()
});

/// Feed fetches that failed or came back empty.
pub static FETCH_FAILURES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "feedrelay_feed_fetch_failures_total",
        "Total feed fetches that failed or returned nothing",
    )
    .unwrap()
});

/// Get all pipeline metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(CYCLES_TOTAL.clone()),
        Box::new(CYCLE_DURATION.clone()),
        Box::new(ENTRIES_TOTAL.clone()),
        Box::new(DISPATCHES_TOTAL.clone()),
        Box::new(FETCH_FAILURES.clone()),
    ]
}
