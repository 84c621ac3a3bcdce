//! Detection of freshly added torrents.
//!
//! Backends expose no push notification for new downloads, so the
//! watcher polls their listings and diffs torrent ids against the
//! previous poll, emitting a [`DownloadAdded`] event per new id.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::downloader::DownloaderClient;

use super::types::DownloadAdded;

/// Polls backends for torrent ids not seen on the previous poll.
///
/// The first successful poll of a backend only seeds its known-id set,
/// so a daemon restart does not replay the existing torrents as
/// events.
pub struct DownloadWatcher {
    clients: Vec<Arc<dyn DownloaderClient>>,
    known: HashMap<String, HashSet<String>>,
}

impl DownloadWatcher {
    pub fn new(clients: Vec<Arc<dyn DownloaderClient>>) -> Self {
        Self {
            clients,
            known: HashMap::new(),
        }
    }

    /// Poll every backend once and collect events for new torrents.
    ///
    /// A listing failure skips that backend until the next poll; its
    /// known-id set is left untouched so nothing is replayed when the
    /// backend comes back.
    pub async fn poll_once(&mut self) -> Vec<DownloadAdded> {
        let mut events = Vec::new();

        for client in &self.clients {
            let backend = client.name();
            let torrents = match client.list_torrents().await {
                Ok(torrents) => torrents,
                Err(e) => {
                    warn!("Watcher failed to list torrents on {}: {}", backend, e);
                    continue;
                }
            };

            let ids: HashSet<String> = torrents
                .into_iter()
                .map(|t| t.id)
                .filter(|id| !id.is_empty())
                .collect();

            match self.known.get_mut(backend) {
                Some(known) => {
                    for id in &ids {
                        if !known.contains(id) {
                            debug!("New torrent {} on {}", id, backend);
                            events.push(DownloadAdded {
                                downloader: backend.to_string(),
                                id: id.clone(),
                            });
                        }
                    }
                    *known = ids;
                }
                None => {
                    debug!("Seeding watcher with {} torrents on {}", ids.len(), backend);
                    self.known.insert(backend.to_string(), ids);
                }
            }
        }

        events
    }
}
