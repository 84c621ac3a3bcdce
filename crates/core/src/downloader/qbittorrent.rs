//! qBittorrent downloader client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::config::DownloaderConfig;

use super::{BackendCapabilities, DownloaderClient, DownloaderError, TorrentSnapshot};

/// qBittorrent WebUI v2 client. Supports incremental tag add/remove.
pub struct QBittorrentClient {
    client: Client,
    config: DownloaderConfig,
    /// Session marker (refreshed on auth failure); the actual cookie
    /// lives in the reqwest cookie jar.
    session: Arc<RwLock<Option<String>>>,
}

impl QBittorrentClient {
    /// Create a new qBittorrent client.
    pub fn new(config: DownloaderConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            config,
            session: Arc::new(RwLock::new(None)),
        }
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and mark the session as established.
    async fn login(&self) -> Result<(), DownloaderError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloaderError::Timeout
                } else if e.is_connect() {
                    DownloaderError::ConnectionFailed(e.to_string())
                } else {
                    DownloaderError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            let mut session = self.session.write().await;
            *session = Some("authenticated".to_string());
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(DownloaderError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(DownloaderError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), DownloaderError> {
        let session = self.session.read().await;
        if session.is_some() {
            return Ok(());
        }
        drop(session);
        self.login().await
    }

    /// Make an authenticated GET request.
    async fn get(&self, endpoint: &str) -> Result<String, DownloaderError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                DownloaderError::Timeout
            } else {
                DownloaderError::ApiError(e.to_string())
            }
        })?;

        let status = response.status();
        if status.as_u16() == 403 {
            // Session expired, retry after login
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| DownloaderError::ApiError(e.to_string()))?;

            if !response.status().is_success() {
                return Err(DownloaderError::ApiError(format!(
                    "HTTP {}",
                    response.status()
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| DownloaderError::ApiError(e.to_string()));
        }

        if !status.is_success() {
            return Err(DownloaderError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DownloaderError::ApiError(e.to_string()))
    }

    /// Make an authenticated POST request with form data.
    async fn post_form(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<String, DownloaderError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let response = self
            .client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    DownloaderError::Timeout
                } else {
                    DownloaderError::ApiError(e.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 403 {
            // Session expired, retry after login
            warn!("qBittorrent session expired, re-authenticating");
            {
                let mut session = self.session.write().await;
                *session = None;
            }
            self.login().await?;

            let response = self
                .client
                .post(&url)
                .form(params)
                .send()
                .await
                .map_err(|e| DownloaderError::ApiError(e.to_string()))?;

            if !response.status().is_success() {
                return Err(DownloaderError::ApiError(format!(
                    "HTTP {}",
                    response.status()
                )));
            }

            return response
                .text()
                .await
                .map_err(|e| DownloaderError::ApiError(e.to_string()));
        }

        if !status.is_success() {
            return Err(DownloaderError::ApiError(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DownloaderError::ApiError(e.to_string()))
    }

    /// Fetch active tracker URLs for one torrent.
    async fn fetch_trackers(&self, hash: &str) -> Result<Vec<String>, DownloaderError> {
        let endpoint = format!("/api/v2/torrents/trackers?hash={}", hash);
        let response = self.get(&endpoint).await?;

        let trackers: Vec<QBTracker> = serde_json::from_str(&response).map_err(|e| {
            DownloaderError::InvalidResponse(format!("Failed to parse trackers: {}", e))
        })?;

        Ok(trackers
            .into_iter()
            .filter(|t| t.tier() >= 0 && !t.url.is_empty() && !t.url.starts_with("**"))
            .map(|t| t.url)
            .collect())
    }
}

/// qBittorrent torrent info response (tagging-relevant fields only).
#[derive(Debug, Deserialize)]
struct QBTorrentInfo {
    #[serde(default)]
    hash: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    save_path: String,
    #[serde(default)]
    tags: String,
}

impl QBTorrentInfo {
    fn into_snapshot(self, trackers: Vec<String>) -> TorrentSnapshot {
        TorrentSnapshot {
            id: self.hash.to_lowercase(),
            name: self.name,
            save_path: self.save_path,
            tags: parse_qb_tags(&self.tags),
            trackers,
        }
    }
}

/// qBittorrent tracker entry.
#[derive(Debug, Deserialize)]
struct QBTracker {
    #[serde(default)]
    url: String,
    // DHT/PeX/LSD virtual rows carry a non-numeric tier in some
    // qBittorrent versions, so this stays untyped.
    #[serde(default)]
    tier: serde_json::Value,
}

impl QBTracker {
    fn tier(&self) -> i64 {
        self.tier.as_i64().unwrap_or(-1)
    }
}

/// Split qBittorrent's comma-separated tag string into clean tags.
fn parse_qb_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl DownloaderClient for QBittorrentClient {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn capabilities(&self) -> BackendCapabilities {
        BackendCapabilities::INCREMENTAL
    }

    async fn list_torrents(&self) -> Result<Vec<TorrentSnapshot>, DownloaderError> {
        let response = self.get("/api/v2/torrents/info").await?;
        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            DownloaderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let mut snapshots = Vec::with_capacity(torrents.len());
        for torrent in torrents {
            if torrent.hash.is_empty() {
                debug!("Skipping torrent without hash: {}", torrent.name);
                continue;
            }
            // A failed tracker read degrades to "no trackers" for this
            // torrent only; the rest of the listing stays usable.
            let trackers = match self.fetch_trackers(&torrent.hash).await {
                Ok(trackers) => trackers,
                Err(e) => {
                    warn!(
                        "Failed to fetch trackers for {} ({}): {}",
                        torrent.hash, torrent.name, e
                    );
                    Vec::new()
                }
            };
            snapshots.push(torrent.into_snapshot(trackers));
        }

        Ok(snapshots)
    }

    async fn get_torrent(&self, id: &str) -> Result<TorrentSnapshot, DownloaderError> {
        let hash = id.to_lowercase();
        let endpoint = format!("/api/v2/torrents/info?hashes={}", hash);
        let response = self.get(&endpoint).await?;

        let torrents: Vec<QBTorrentInfo> = serde_json::from_str(&response).map_err(|e| {
            DownloaderError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        let torrent = torrents
            .into_iter()
            .find(|t| !t.hash.is_empty())
            .ok_or_else(|| DownloaderError::TorrentNotFound(id.to_string()))?;

        let trackers = self.fetch_trackers(&torrent.hash).await?;
        Ok(torrent.into_snapshot(trackers))
    }

    async fn add_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        let hash = id.to_lowercase();
        let joined = tags.join(",");
        self.post_form(
            "/api/v2/torrents/addTags",
            &[("hashes", hash.as_str()), ("tags", joined.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn remove_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        let hash = id.to_lowercase();
        let joined = tags.join(",");
        self.post_form(
            "/api/v2/torrents/removeTags",
            &[("hashes", hash.as_str()), ("tags", joined.as_str())],
        )
        .await?;
        Ok(())
    }

    async fn replace_tags(&self, id: &str, tags: &[String]) -> Result<(), DownloaderError> {
        let hash = id.to_lowercase();
        let joined = tags.join(",");
        self.post_form(
            "/api/v2/torrents/setTags",
            &[("hashes", hash.as_str()), ("tags", joined.as_str())],
        )
        .await?;
        Ok(())
    }
}
