//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Tagging runs (counts, duration, torrents scanned)
//! - Tag mutations per backend
//! - Reactive download-added events

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts};

// =============================================================================
// Run Metrics
// =============================================================================

/// Tagging runs total by result.
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagliere_runs_total", "Total tagging runs"),
        &["result"], // "success", "partial", "cancelled"
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("tagliere_run_duration_seconds", "Duration of tagging runs")
            .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &[],
    )
    .unwrap()
});

/// Torrents scanned total by backend.
pub static TORRENTS_SCANNED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagliere_torrents_scanned_total", "Total torrents scanned"),
        &["backend"],
    )
    .unwrap()
});

// =============================================================================
// Mutation Metrics
// =============================================================================

/// Tag mutations total by backend, operation and status.
pub static TAG_MUTATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("tagliere_tag_mutations_total", "Total tag mutations applied"),
        &["backend", "operation", "status"], // operation: "add", "remove", "replace"; status: "success", "error"
    )
    .unwrap()
});

/// Per-torrent processing failures total by backend.
pub static TORRENT_FAILURES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tagliere_torrent_failures_total",
            "Total torrents that failed processing",
        ),
        &["backend"],
    )
    .unwrap()
});

// =============================================================================
// Reactive Path Metrics
// =============================================================================

/// Download-added events handled by result.
pub static DOWNLOAD_ADDED_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "tagliere_download_added_events_total",
            "Total reactive download-added events handled",
        ),
        &["result"], // "tagged", "noop", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(RUNS_TOTAL.clone()),
        Box::new(RUN_DURATION.clone()),
        Box::new(TORRENTS_SCANNED.clone()),
        Box::new(TAG_MUTATIONS.clone()),
        Box::new(TORRENT_FAILURES.clone()),
        Box::new(DOWNLOAD_ADDED_EVENTS.clone()),
    ]
}
