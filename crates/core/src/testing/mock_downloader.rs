//! Mock downloader backend for testing.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::downloader::{
    BackendCapabilities, DownloaderClient, DownloaderError, TorrentSnapshot,
};

/// Which tag mutation primitive a recorded call used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagOperation {
    Add,
    Remove,
    Replace,
}

/// One recorded tag mutation, for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedMutation {
    pub torrent_id: String,
    pub operation: TagOperation,
    pub tags: Vec<String>,
    /// When the call was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the [`DownloaderClient`] trait.
///
/// Provides controllable behavior for testing:
/// - Pre-populated torrent snapshots, returned in insertion order
/// - Recorded tag mutations for assertions
/// - One-shot error injection per operation
///
/// Mutations are applied to the stored snapshots, so a follow-up
/// `get_torrent` observes the updated tag list.
#[derive(Debug)]
pub struct MockDownloader {
    name: String,
    capabilities: BackendCapabilities,
    torrents: Arc<RwLock<Vec<TorrentSnapshot>>>,
    mutations: Arc<RwLock<Vec<RecordedMutation>>>,
    /// If set, the next operation fails with this error.
    next_error: Arc<RwLock<Option<DownloaderError>>>,
    /// If set, mutations against this torrent id fail.
    failing_torrent: Arc<RwLock<Option<String>>>,
}

impl MockDownloader {
    /// Create a mock with incremental capabilities (qBittorrent-style).
    pub fn incremental(name: &str) -> Self {
        Self::with_capabilities(name, BackendCapabilities::INCREMENTAL)
    }

    /// Create a mock with replace-only capabilities (Transmission-style).
    pub fn replace_only(name: &str) -> Self {
        Self::with_capabilities(name, BackendCapabilities::REPLACE_ONLY)
    }

    pub fn with_capabilities(name: &str, capabilities: BackendCapabilities) -> Self {
        Self {
            name: name.to_string(),
            capabilities,
            torrents: Arc::new(RwLock::new(Vec::new())),
            mutations: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing_torrent: Arc::new(RwLock::new(None)),
        }
    }

    /// Pre-populate a torrent snapshot.
    pub async fn add_snapshot(&self, snapshot: TorrentSnapshot) {
        self.torrents.write().await.push(snapshot);
    }

    /// Get all recorded tag mutations.
    pub async fn recorded_mutations(&self) -> Vec<RecordedMutation> {
        self.mutations.read().await.clone()
    }

    /// Clear recorded mutations.
    pub async fn clear_recorded(&self) {
        self.mutations.write().await.clear();
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: DownloaderError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every tag mutation against the given torrent id fail.
    pub async fn fail_mutations_for(&self, torrent_id: &str) {
        *self.failing_torrent.write().await = Some(torrent_id.to_string());
    }

    /// Take the next error if set.
    async fn take_error(&self) -> Option<DownloaderError> {
        self.next_error.write().await.take()
    }

    async fn check_mutation(&self, id: &str) -> Result<(), DownloaderError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        if self.failing_torrent.read().await.as_deref() == Some(id) {
            return Err(DownloaderError::ApiError(format!(
                "mutation rejected for {id}"
            )));
        }
        Ok(())
    }

    async fn record(&self, id: &str, operation: TagOperation, tags: &[String]) {
        self.mutations.write().await.push(RecordedMutation {
            torrent_id: id.to_string(),
            operation,
            tags: tags.to_vec(),
            timestamp: Utc::now(),
        });
    }
}

#[async_trait]
impl DownloaderClient for MockDownloader {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, DownloaderError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        Ok(self.torrents.read().await.clone())
    }

    async fn get_torrent(&self, id: &str) -> Result<TorrentSnapshot, DownloaderError> {
        if let Some(err) = self.take_error().await {
            return Err(err);
        }
        self.torrents
            .read()
            .await
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| DownloaderError::TorrentNotFound(id.to_string()))
    }

    async fn add_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        self.check_mutation(id).await?;
        self.record(id, TagOperation::Add, tags).await;

        let mut torrents = self.torrents.write().await;
        if let Some(torrent) = torrents.iter_mut().find(|t| t.id == id) {
            for tag in tags {
                if !torrent.tags.contains(tag) {
                    torrent.tags.push(tag.clone());
                }
            }
        }
        Ok(())
    }

    async fn remove_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        self.check_mutation(id).await?;
        self.record(id, TagOperation::Remove, tags).await;

        let mut torrents = self.torrents.write().await;
        if let Some(torrent) = torrents.iter_mut().find(|t| t.id == id) {
            torrent.tags.retain(|t| !tags.contains(t));
        }
        Ok(())
    }

    async fn replace_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        self.check_mutation(id).await?;
        self.record(id, TagOperation::Replace, tags).await;

        let mut torrents = self.torrents.write().await;
        if let Some(torrent) = torrents.iter_mut().find(|t| t.id == id) {
            torrent.tags = tags.to_vec();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(id: &str, tags: &[&str]) -> TorrentSnapshot {
        TorrentSnapshot {
            id: id.to_string(),
            name: format!("Torrent {id}"),
            save_path: "/downloads".to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            trackers: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_mutations_update_snapshots() {
        let client = MockDownloader::incremental("mock");
        client.add_snapshot(snapshot("a", &["old"])).await;

        client.add_tags("a", &["new".to_string()]).await.unwrap();
        let t = client.get_torrent("a").await.unwrap();
        assert_eq!(t.tags, vec!["old".to_string(), "new".to_string()]);

        client.remove_tags("a", &["old".to_string()]).await.unwrap();
        let t = client.get_torrent("a").await.unwrap();
        assert_eq!(t.tags, vec!["new".to_string()]);

        client.replace_tags("a", &["only".to_string()]).await.unwrap();
        let t = client.get_torrent("a").await.unwrap();
        assert_eq!(t.tags, vec!["only".to_string()]);

        let recorded = client.recorded_mutations().await;
        assert_eq!(recorded.len(), 3);
        assert_eq!(recorded[0].operation, TagOperation::Add);
        assert_eq!(recorded[2].operation, TagOperation::Replace);
    }

    #[tokio::test]
    async fn test_error_injection_is_one_shot() {
        let client = MockDownloader::incremental("mock");
        client.add_snapshot(snapshot("a", &[])).await;
        client
            .set_next_error(DownloaderError::ConnectionFailed("test".to_string()))
            .await;

        assert!(client.list_torrents().await.is_err());
        assert!(client.list_torrents().await.is_ok());
    }

    #[tokio::test]
    async fn test_per_torrent_failure() {
        let client = MockDownloader::incremental("mock");
        client.add_snapshot(snapshot("bad", &[])).await;
        client.add_snapshot(snapshot("good", &[])).await;
        client.fail_mutations_for("bad").await;

        assert!(client.add_tags("bad", &["x".to_string()]).await.is_err());
        assert!(client.add_tags("good", &["x".to_string()]).await.is_ok());
    }

    #[tokio::test]
    async fn test_get_unknown_torrent() {
        let client = MockDownloader::replace_only("mock");
        let err = client.get_torrent("nope").await.unwrap_err();
        assert!(matches!(err, DownloaderError::TorrentNotFound(_)));
    }
}
