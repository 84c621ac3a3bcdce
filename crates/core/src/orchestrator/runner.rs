//! Tagging run orchestration.
//!
//! Walks every configured backend, resolves the target tag set per
//! torrent and applies the planned mutation. Failures are isolated per
//! torrent (and per backend for list failures): one broken tracker
//! response never aborts a run.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{TaggingConfig, SAVE_PATH_MAP_PLACEHOLDER, TRACKER_MAP_PLACEHOLDER};
use crate::downloader::{DownloaderClient, DownloaderError, TorrentSnapshot};
use crate::metrics;
use crate::sites::SiteRegistry;
use crate::tagger::{has_removable_tags, plan_mutation, MutationPlan, RuleTable, TagResolver};

use super::types::{CancelFlag, DownloadAdded, RunSummary};

/// Drives tagging runs over a fixed set of downloader backends.
///
/// The backend list is assumed pre-filtered and ordered per the job
/// configuration; the orchestrator itself never consults config for
/// backend selection.
pub struct Tagger {
    config: TaggingConfig,
    clients: Vec<Arc<dyn DownloaderClient>>,
    registry: Arc<dyn SiteRegistry>,
}

impl Tagger {
    pub fn new(
        config: TaggingConfig,
        clients: Vec<Arc<dyn DownloaderClient>>,
        registry: Arc<dyn SiteRegistry>,
    ) -> Self {
        Self {
            config,
            clients,
            registry,
        }
    }

    /// Execute one full tagging run across all backends.
    ///
    /// The cancel flag is checked between torrents; a tripped flag
    /// stops the run at the next boundary and marks the summary
    /// cancelled.
    pub async fn run(&self, cancel: &CancelFlag) -> RunSummary {
        let started = Instant::now();
        let mut summary = RunSummary::default();

        if !self.config.enabled {
            debug!("Tagging disabled, skipping run");
            return summary;
        }
        if self.clients.is_empty() {
            warn!("No downloader backends available, skipping run");
            return summary;
        }

        let resolver = self.build_resolver().await;

        'backends: for client in &self.clients {
            if cancel.is_cancelled() {
                summary.cancelled = true;
                break;
            }

            let backend = client.name();
            let torrents = match client.list_torrents().await {
                Ok(torrents) => torrents,
                Err(e) => {
                    warn!("Failed to list torrents on {}: {}", backend, e);
                    summary.failures += 1;
                    continue;
                }
            };

            summary.backends_scanned += 1;
            metrics::TORRENTS_SCANNED
                .with_label_values(&[backend])
                .inc_by(torrents.len() as u64);
            debug!("Scanning {} torrents on {}", torrents.len(), backend);

            for snapshot in &torrents {
                if cancel.is_cancelled() {
                    summary.cancelled = true;
                    break 'backends;
                }
                if snapshot.id.is_empty() {
                    debug!("Skipping torrent without id on {}", backend);
                    continue;
                }
                if snapshot.save_path.is_empty() {
                    debug!(
                        "Torrent {} on {} reports no save path",
                        snapshot.id, backend
                    );
                }

                summary.torrents_seen += 1;
                match self.process_torrent(client.as_ref(), &resolver, snapshot).await {
                    Ok(true) => summary.torrents_tagged += 1,
                    Ok(false) => {}
                    Err(e) => {
                        warn!(
                            "Failed to tag torrent {} ({}) on {}: {}",
                            snapshot.id, snapshot.name, backend, e
                        );
                        metrics::TORRENT_FAILURES
                            .with_label_values(&[backend])
                            .inc();
                        summary.failures += 1;
                    }
                }
            }
        }

        metrics::RUNS_TOTAL
            .with_label_values(&[summary.result_label()])
            .inc();
        metrics::RUN_DURATION
            .with_label_values(&[])
            .observe(started.elapsed().as_secs_f64());
        info!(
            "Tagging run finished: {} backends, {} torrents seen, {} tagged, {} failures{}",
            summary.backends_scanned,
            summary.torrents_seen,
            summary.torrents_tagged,
            summary.failures,
            if summary.cancelled { " (cancelled)" } else { "" },
        );

        summary
    }

    /// React to a single freshly added torrent.
    ///
    /// Returns whether a mutation was applied. Unknown downloader names
    /// are logged and ignored; events can outlive config edits.
    pub async fn handle_download_added(
        &self,
        event: &DownloadAdded,
    ) -> Result<bool, DownloaderError> {
        if !self.config.enabled {
            return Ok(false);
        }

        let Some(client) = self
            .clients
            .iter()
            .find(|c| c.name() == event.downloader)
        else {
            warn!(
                "Download-added event for unknown downloader {}, ignoring",
                event.downloader
            );
            return Ok(false);
        };

        let resolver = self.build_resolver().await;
        let result = async {
            let snapshot = client.get_torrent(&event.id).await?;
            self.process_torrent(client.as_ref(), &resolver, &snapshot)
                .await
        }
        .await;

        let label = match &result {
            Ok(true) => "tagged",
            Ok(false) => "noop",
            Err(_) => "failed",
        };
        metrics::DOWNLOAD_ADDED_EVENTS
            .with_label_values(&[label])
            .inc();

        result
    }

    /// Build the per-run resolver.
    ///
    /// Rule tables are re-parsed every run so config edits take effect
    /// without a restart; known site names are fetched once and a
    /// registry failure degrades to an empty set.
    async fn build_resolver(&self) -> TagResolver {
        let path_rules =
            RuleTable::parse(&self.config.save_path_map, SAVE_PATH_MAP_PLACEHOLDER);
        let tracker_rules =
            RuleTable::parse(&self.config.tracker_map, TRACKER_MAP_PLACEHOLDER);

        let known_sites = match self.registry.known_site_names().await {
            Ok(names) => names,
            Err(e) => {
                warn!("Failed to fetch known site names: {}", e);
                Vec::new()
            }
        };

        TagResolver::new(
            path_rules,
            tracker_rules,
            self.config.policy(),
            known_sites,
            Arc::clone(&self.registry),
        )
    }

    /// Resolve, plan and apply for one torrent. Returns whether a
    /// mutation was applied.
    async fn process_torrent(
        &self,
        client: &dyn DownloaderClient,
        resolver: &TagResolver,
        snapshot: &TorrentSnapshot,
    ) -> Result<bool, DownloaderError> {
        let target = resolver.resolve(snapshot).await;
        let plan = plan_mutation(
            client.capabilities(),
            &snapshot.tags,
            &target,
            self.config.policy(),
            self.config.site_first,
        );
        self.apply_plan(client, snapshot, plan).await
    }

    async fn apply_plan(
        &self,
        client: &dyn DownloaderClient,
        snapshot: &TorrentSnapshot,
        plan: MutationPlan,
    ) -> Result<bool, DownloaderError> {
        let backend = client.name();
        match plan {
            MutationPlan::NoOp => Ok(false),
            MutationPlan::AddTags(tags) => {
                debug!(
                    "Adding tags {:?} to {} ({}) on {}",
                    tags, snapshot.id, snapshot.name, backend
                );
                let result = client.add_tags(&snapshot.id, &tags).await;
                record_mutation(backend, "add", &result);
                result.map(|()| true)
            }
            MutationPlan::ReplaceAll {
                clear_current,
                tags,
            } => {
                if clear_current && has_removable_tags(&snapshot.tags) {
                    let result = client.remove_tags(&snapshot.id, &snapshot.tags).await;
                    record_mutation(backend, "remove", &result);
                    result?;
                }
                debug!(
                    "Replacing tags with {:?} on {} ({}) on {}",
                    tags, snapshot.id, snapshot.name, backend
                );
                let result = client.replace_tags(&snapshot.id, &tags).await;
                record_mutation(backend, "replace", &result);
                result.map(|()| true)
            }
        }
    }
}

fn record_mutation(backend: &str, operation: &str, result: &Result<(), DownloaderError>) {
    let status = if result.is_ok() { "success" } else { "error" };
    metrics::TAG_MUTATIONS
        .with_label_values(&[backend, operation, status])
        .inc();
}
