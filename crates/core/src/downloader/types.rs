//! Types for downloader backend operations.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during downloader backend operations.
#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Torrent not found: {0}")]
    TorrentNotFound(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Read-only view of one torrent at tagging time.
///
/// Captured once per torrent per run and never mutated afterwards; the
/// resolver only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorrentSnapshot {
    /// Backend-specific handle (info hash), non-empty.
    pub id: String,
    /// Torrent name, for logging only.
    pub name: String,
    /// Save path on disk; empty when the backend did not report one.
    pub save_path: String,
    /// Current tags/labels, in backend order.
    pub tags: Vec<String>,
    /// Active tracker URLs (non-negative tier), in backend order.
    pub trackers: Vec<String>,
}

/// What tag mutations a backend type supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendCapabilities {
    /// Can add individual tags without resending the full set.
    pub supports_incremental_add: bool,
    /// Can remove individual tags.
    pub supports_tag_removal: bool,
}

impl BackendCapabilities {
    /// Incremental add/remove primitives (qBittorrent-style).
    pub const INCREMENTAL: Self = Self {
        supports_incremental_add: true,
        supports_tag_removal: true,
    };

    /// Whole-label-list replacement only (Transmission-style).
    pub const REPLACE_ONLY: Self = Self {
        supports_incremental_add: false,
        supports_tag_removal: false,
    };
}

/// Trait for downloader backends.
///
/// One implementation per backend type; the tagging engine never
/// branches on backend identity beyond reading [`BackendCapabilities`].
#[async_trait]
pub trait DownloaderClient: Send + Sync {
    /// Configured instance name, for logging and event routing.
    fn name(&self) -> &str;

    /// Tag mutation primitives this backend supports.
    fn capabilities(&self) -> BackendCapabilities;

    /// Snapshot every torrent the backend manages.
    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, DownloaderError>;

    /// Snapshot a single torrent by id.
    async fn get_torrent(&self, id: &str) -> Result<TorrentSnapshot, DownloaderError>;

    /// Add tags without touching existing ones.
    /// Only called when `supports_incremental_add`.
    async fn add_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError>;

    /// Remove the given tags. Only called when `supports_tag_removal`.
    async fn remove_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError>;

    /// Replace the full tag list. Always available.
    async fn replace_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError>;
}
