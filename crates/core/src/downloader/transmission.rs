//! Transmission downloader client.
//!
//! Transmission has no incremental tag primitives; `torrent-set` with a
//! `labels` array replaces the whole list, so this backend is
//! replace-only and the reconciler merges/overwrites accordingly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::DownloaderConfig;

use super::{BackendCapabilities, DownloaderClient, DownloaderError, TorrentSnapshot};

const SESSION_HEADER: &str = "X-Transmission-Session-Id";

const TORRENT_FIELDS: &[&str] = &["hashString", "name", "downloadDir", "labels", "trackers"];

/// Transmission RPC client. Replace-only tag semantics.
pub struct TransmissionClient {
    client: Client,
    config: DownloaderConfig,
    /// Session id from the 409 handshake, refreshed when it expires.
    session_id: Arc<RwLock<Option<String>>>,
}

impl TransmissionClient {
    /// Create a new Transmission client.
    pub fn new(config: DownloaderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            session_id: Arc::new(RwLock::new(None)),
        }
    }

    /// RPC endpoint URL.
    fn rpc_url(&self) -> String {
        let base = self.config.url.trim_end_matches('/');
        if base.ends_with("/rpc") {
            base.to_string()
        } else {
            format!("{}/transmission/rpc", base)
        }
    }

    /// Issue one RPC call, replaying once after a 409 session handshake.
    async fn rpc(&self, body: serde_json::Value) -> Result<serde_json::Value, DownloaderError> {
        let url = self.rpc_url();

        for attempt in 0..2 {
            let mut request = self.client.post(&url).json(&body);

            if !self.config.username.is_empty() {
                request = request.basic_auth(
                    &self.config.username,
                    Some(&self.config.password),
                );
            }

            if let Some(session) = self.session_id.read().await.as_deref() {
                request = request.header(SESSION_HEADER, session);
            }

            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    DownloaderError::Timeout
                } else if e.is_connect() {
                    DownloaderError::ConnectionFailed(e.to_string())
                } else {
                    DownloaderError::ApiError(e.to_string())
                }
            })?;

            let status = response.status();

            if status == StatusCode::CONFLICT && attempt == 0 {
                // Session handshake: pick up the id and replay once.
                let session = response
                    .headers()
                    .get(SESSION_HEADER)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string)
                    .ok_or_else(|| {
                        DownloaderError::ApiError(
                            "409 without session id header".to_string(),
                        )
                    })?;
                debug!("Transmission session established");
                *self.session_id.write().await = Some(session);
                continue;
            }

            if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                return Err(DownloaderError::AuthenticationFailed(format!(
                    "HTTP {}",
                    status
                )));
            }

            if !status.is_success() {
                return Err(DownloaderError::ApiError(format!("HTTP {}", status)));
            }

            let envelope: RpcEnvelope = response
                .json()
                .await
                .map_err(|e| DownloaderError::InvalidResponse(e.to_string()))?;

            if envelope.result != "success" {
                return Err(DownloaderError::ApiError(envelope.result));
            }

            return Ok(envelope.arguments);
        }

        Err(DownloaderError::AuthenticationFailed(
            "Session handshake failed".to_string(),
        ))
    }

    /// Fetch snapshots, optionally restricted to specific hashes.
    async fn fetch_torrents(
        &self,
        ids: Option<&[&str]>,
    ) -> Result<Vec<TorrentSnapshot>, DownloaderError> {
        let mut arguments = json!({ "fields": TORRENT_FIELDS });
        if let Some(ids) = ids {
            arguments["ids"] = json!(ids);
        }

        let response = self
            .rpc(json!({ "method": "torrent-get", "arguments": arguments }))
            .await?;

        let list: TorrentGetArguments = serde_json::from_value(response).map_err(|e| {
            DownloaderError::InvalidResponse(format!("Failed to parse torrent-get: {}", e))
        })?;

        let snapshots = list
            .torrents
            .into_iter()
            .filter_map(|t| {
                if t.hash_string.is_empty() {
                    debug!("Skipping torrent without hash: {}", t.name);
                    return None;
                }
                Some(t.into_snapshot())
            })
            .collect();

        Ok(snapshots)
    }
}

#[derive(Debug, Deserialize)]
struct RpcEnvelope {
    result: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct TorrentGetArguments {
    #[serde(default)]
    torrents: Vec<TrTorrent>,
}

#[derive(Debug, Deserialize)]
struct TrTorrent {
    #[serde(rename = "hashString", default)]
    hash_string: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "downloadDir", default)]
    download_dir: String,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    trackers: Vec<TrTracker>,
}

#[derive(Debug, Deserialize)]
struct TrTracker {
    #[serde(default)]
    announce: String,
    #[serde(default)]
    tier: i64,
}

impl TrTorrent {
    fn into_snapshot(self) -> TorrentSnapshot {
        let trackers = self
            .trackers
            .into_iter()
            .filter(|t| t.tier >= 0 && !t.announce.is_empty())
            .map(|t| t.announce)
            .collect();

        TorrentSnapshot {
            id: self.hash_string.to_lowercase(),
            name: self.name,
            save_path: self.download_dir,
            tags: self.labels,
            trackers,
        }
    }
}

#[async_trait]
impl DownloaderClient for TransmissionClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::REPLACE_ONLY
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, DownloaderError> {
        self.fetch_torrents(None).await
    }

    async fn get_torrent(&self, id: &str) -> Result<TorrentSnapshot, DownloaderError> {
        let torrents = self.fetch_torrents(Some(&[id])).await?;
        torrents
            .into_iter()
            .next()
            .ok_or_else(|| DownloaderError::TorrentNotFound(id.to_string()))
    }

    async fn add_tags(&self, _id: &str, _tags: &[String]) -> Result<(), DownloaderError> {
        Err(DownloaderError::ApiError(
            "Transmission does not support incremental tag addition".to_string(),
        ))
    }

    async fn remove_tags(&self, _id: &str, _tags: &[String]) -> Result<(), DownloaderError> {
        Err(DownloaderError::ApiError(
            "Transmission does not support incremental tag removal".to_string(),
        ))
    }

    async fn replace_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        self.rpc(json!({
            "method": "torrent-set",
            "arguments": { "ids": [id], "labels": tags },
        }))
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_snapshot_filters_trackers() {
        let torrent: TrTorrent = serde_json::from_str(
            r#"{
                "hashString": "DEF456",
                "name": "Test",
                "downloadDir": "/data",
                "labels": ["keep"],
                "trackers": [
                    {"announce": "https://t.sitex.org/a", "tier": 0},
                    {"announce": "udp://dead.example/a", "tier": -1},
                    {"announce": "", "tier": 1}
                ]
            }"#,
        )
        .unwrap();

        let snapshot = torrent.into_snapshot();
        assert_eq!(snapshot.id, "def456");
        assert_eq!(snapshot.save_path, "/data");
        assert_eq!(snapshot.tags, vec!["keep".to_string()]);
        assert_eq!(snapshot.trackers, vec!["https://t.sitex.org/a".to_string()]);
    }

    #[test]
    fn test_into_snapshot_missing_fields() {
        let torrent: TrTorrent = serde_json::from_str(r#"{"hashString": "abc"}"#).unwrap();
        let snapshot = torrent.into_snapshot();
        assert_eq!(snapshot.save_path, "");
        assert!(snapshot.tags.is_empty());
        assert!(snapshot.trackers.is_empty());
    }

    #[test]
    fn test_rpc_envelope_failure() {
        let envelope: RpcEnvelope =
            serde_json::from_str(r#"{"result": "no such method"}"#).unwrap();
        assert_ne!(envelope.result, "success");
    }

    #[test]
    fn test_rpc_url_normalization() {
        let mut config = DownloaderConfig::for_tests("tr", "http://localhost:9091");
        let client = TransmissionClient::new(config.clone());
        assert_eq!(client.rpc_url(), "http://localhost:9091/transmission/rpc");

        config.url = "http://localhost:9091/transmission/rpc/".to_string();
        let client = TransmissionClient::new(config);
        assert_eq!(client.rpc_url(), "http://localhost:9091/transmission/rpc");
    }
}
