//! Types for the tagging run orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Cooperative cancellation flag, checked between torrents.
///
/// Cloning shares the flag; tripping it asks an in-flight run to stop
/// at the next torrent boundary. A cancelled run never leaves a torrent
/// half-mutated.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Outcome counters for one tagging run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Backends whose torrent list was fetched.
    pub backends_scanned: usize,
    /// Torrents inspected across all backends.
    pub torrents_seen: usize,
    /// Torrents that received at least one tag mutation.
    pub torrents_tagged: usize,
    /// Torrents (or whole backends) that failed processing.
    pub failures: usize,
    /// The run stopped early on a cancellation request.
    pub cancelled: bool,
}

impl RunSummary {
    /// Metric label for this run's result.
    pub fn result_label(&self) -> &'static str {
        if self.cancelled {
            "cancelled"
        } else if self.failures > 0 {
            "partial"
        } else {
            "success"
        }
    }
}

/// A torrent freshly added on one of the configured downloaders.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloadAdded {
    /// Configured downloader instance name.
    pub downloader: String,
    /// Backend-specific torrent id (info hash).
    pub id: String,
}
