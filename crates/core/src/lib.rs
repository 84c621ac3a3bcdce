pub mod config;
pub mod downloader;
pub mod metrics;
pub mod orchestrator;
pub mod sites;
pub mod tagger;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use downloader::{
    BackendCapabilities, DownloaderClient, DownloaderError, QBittorrentClient, TorrentSnapshot,
    TransmissionClient,
};
pub use orchestrator::{CancelFlag, DownloadAdded, DownloadWatcher, RunSummary, Tagger};
pub use sites::{SiteRegistry, SiteRegistryError, StaticSiteRegistry};
pub use tagger::{MutationPlan, ResolutionPolicy, RuleTable, TagResolver};
