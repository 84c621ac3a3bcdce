//! Test doubles for downloader backends and the site registry.

mod mock_downloader;
mod mock_site_registry;

pub use mock_downloader::{MockDownloader, RecordedMutation, TagOperation};
pub use mock_site_registry::MockSiteRegistry;
