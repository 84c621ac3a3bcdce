//! Tagging run orchestration: batch runs and reactive handling of
//! freshly added torrents.

mod runner;
mod types;
mod watcher;

pub use runner::Tagger;
pub use types::{CancelFlag, DownloadAdded, RunSummary};
pub use watcher::DownloadWatcher;
