//! Mutation planning.
//!
//! Backends differ in their tag primitives: qBittorrent can add/remove
//! individual tags, Transmission can only replace the whole label list.
//! The reconciler turns (current, target, policy) into the cheapest
//! mutation the backend can express, so the resolver stays
//! backend-agnostic.

use crate::downloader::BackendCapabilities;

use super::resolver::ResolutionPolicy;

/// The backend mutation required to reach the target tag set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationPlan {
    /// Nothing to do.
    NoOp,
    /// Add these tags, leaving everything else untouched.
    AddTags(Vec<String>),
    /// Submit this complete tag list.
    ReplaceAll {
        /// Remove the current tags first (incremental backends in
        /// overwrite mode). Skipped at apply time when current tags are
        /// empty or all blank.
        clear_current: bool,
        tags: Vec<String>,
    },
}

impl MutationPlan {
    /// True when the plan issues no backend calls.
    pub fn is_noop(&self) -> bool {
        matches!(self, MutationPlan::NoOp)
    }
}

/// Plan the tag mutation for one torrent.
///
/// `site_first` only applies to overwrite mode on replace-only
/// backends: the resolver appends the site tag last, so the list is
/// reversed to put it first in the submitted label list.
pub fn plan_mutation(
    caps: BackendCapabilities,
    current: &[String],
    target: &[String],
    policy: ResolutionPolicy,
    site_first: bool,
) -> MutationPlan {
    if target.is_empty() {
        return MutationPlan::NoOp;
    }

    match policy {
        ResolutionPolicy::Additive if caps.supports_incremental_add => {
            let to_add = difference(target, current);
            if to_add.is_empty() {
                MutationPlan::NoOp
            } else {
                MutationPlan::AddTags(to_add)
            }
        }
        ResolutionPolicy::Additive => {
            // Replace-only backend: merge current and target, first
            // seen wins.
            let merged: Vec<String> = current.iter().chain(target.iter()).cloned().collect();
            MutationPlan::ReplaceAll {
                clear_current: false,
                tags: dedupe(&merged),
            }
        }
        ResolutionPolicy::Overwrite => {
            let mut tags = dedupe(target);
            let clear_current = caps.supports_tag_removal;
            if !caps.supports_incremental_add && site_first {
                tags.reverse();
            }
            MutationPlan::ReplaceAll {
                clear_current,
                tags,
            }
        }
    }
}

/// Whether a remove-tags call for `current` is worth issuing.
pub fn has_removable_tags(current: &[String]) -> bool {
    current.iter().any(|tag| !tag.trim().is_empty())
}

/// Deduplicate preserving first-seen order.
fn dedupe(tags: &[String]) -> Vec<String> {
    let mut seen = Vec::with_capacity(tags.len());
    for tag in tags {
        if !seen.contains(tag) {
            seen.push(tag.clone());
        }
    }
    seen
}

/// Elements of `a` not present in `b`, preserving `a`'s order.
fn difference(a: &[String], b: &[String]) -> Vec<String> {
    a.iter().filter(|tag| !b.contains(tag)).cloned().collect()
}
