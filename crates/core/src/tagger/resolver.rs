//! Target tag computation.
//!
//! Given a torrent snapshot and the parsed rule tables, decides which
//! tags should be present. The output order is a contract: the path tag
//! (if any) comes first, the site tag (if any) second; the reconciler
//! relies on that for `site_first` handling.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::debug;

use crate::downloader::TorrentSnapshot;
use crate::sites::{extract_domain, SiteRegistry};

use super::rules::RuleTable;

/// Run-wide tagging policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Preserve existing tags, only add newly computed ones.
    Additive,
    /// Replace the relevant tag set each run.
    Overwrite,
}

/// Computes the target tag set for one torrent.
pub struct TagResolver {
    path_rules: RuleTable,
    tracker_rules: RuleTable,
    policy: ResolutionPolicy,
    /// Canonical site names, fetched once per run. Used to skip site
    /// re-derivation in additive mode when a site tag is already there.
    known_sites: HashSet<String>,
    registry: Arc<dyn SiteRegistry>,
}

impl TagResolver {
    pub fn new(
        path_rules: RuleTable,
        tracker_rules: RuleTable,
        policy: ResolutionPolicy,
        known_sites: Vec<String>,
        registry: Arc<dyn SiteRegistry>,
    ) -> Self {
        Self {
            path_rules,
            tracker_rules,
            policy,
            known_sites: known_sites.into_iter().collect(),
            registry,
        }
    }

    /// Resolve one tracker URL to a site tag.
    ///
    /// Custom tracker rules win over the registry; the first rule whose
    /// pattern occurs in the URL decides. Registry failures degrade to
    /// "no match" so one flaky lookup cannot fail the torrent.
    pub async fn resolve_site_tag(&self, tracker_url: &str) -> Option<String> {
        if let Some(tag) = self.tracker_rules.first_match(tracker_url) {
            return Some(tag.to_string());
        }

        let domain = extract_domain(tracker_url)?;
        match self.registry.lookup_by_domain(&domain).await {
            Ok(site) => site,
            Err(e) => {
                debug!("Site registry lookup for {} failed: {}", domain, e);
                None
            }
        }
    }

    /// Compute the ordered, deduplicated target tag set for a torrent.
    ///
    /// At most one path-derived and one site-derived tag; a torrent
    /// with no save path or no trackers simply yields fewer tags.
    pub async fn resolve(&self, snapshot: &TorrentSnapshot) -> Vec<String> {
        let mut target: Vec<String> = Vec::with_capacity(2);

        if let Some(tag) = self.path_rules.first_match(&snapshot.save_path) {
            target.push(tag.to_string());
        }

        if self.should_attempt_site_tag(snapshot) {
            for tracker_url in &snapshot.trackers {
                if let Some(tag) = self.resolve_site_tag(tracker_url).await {
                    if !target.contains(&tag) {
                        target.push(tag);
                    }
                    break;
                }
            }
        }

        target
    }

    /// In additive mode a torrent that already carries any known site
    /// name keeps it; only overwrite mode re-derives.
    fn should_attempt_site_tag(&self, snapshot: &TorrentSnapshot) -> bool {
        match self.policy {
            ResolutionPolicy::Overwrite => true,
            ResolutionPolicy::Additive => !snapshot
                .tags
                .iter()
                .any(|tag| self.known_sites.contains(tag)),
        }
    }
}
