//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Catalog searches (per mode and outcome)
//! - Downloads (outcome and duration)
//! - Deliveries and incoming updates

use once_cell::sync::Lazy;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts};

// =============================================================================
// Catalog Metrics
// =============================================================================

/// Catalog searches total by mode and result.
pub static SEARCHES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_searches_total", "Total catalog searches"),
        &["mode", "result"], // result: "found", "empty", "error"
    )
    .unwrap()
});

// =============================================================================
// Download Metrics
// =============================================================================

/// Downloads total by result.
pub static DOWNLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_downloads_total", "Total download requests"),
        &["result"], // "success", "rejected", "failed"
    )
    .unwrap()
});

/// Download duration in seconds, from purge to artifact found.
pub static DOWNLOAD_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "tunegrab_download_duration_seconds",
            "Duration of download attempts",
        )
        .buckets(vec![1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 60.0, 90.0, 150.0]),
    )
    .unwrap()
});

// =============================================================================
// Conversation Metrics
// =============================================================================

/// Audio deliveries total by result.
pub static DELIVERIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_deliveries_total", "Total audio deliveries"),
        &["result"], // "sent", "send_failed", "not_found"
    )
    .unwrap()
});

/// Incoming updates total by kind.
pub static UPDATES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tunegrab_updates_total", "Total chat updates handled"),
        &["kind"], // "command", "text", "callback"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(SEARCHES_TOTAL.clone()),
        Box::new(DOWNLOADS_TOTAL.clone()),
        Box::new(DOWNLOAD_DURATION.clone()),
        Box::new(DELIVERIES_TOTAL.clone()),
        Box::new(UPDATES_TOTAL.clone()),
    ]
}
