use serde::{Deserialize, Serialize};

use crate::tagger::ResolutionPolicy;

/// Prompt text shown as the tracker map default; parses to no rules.
pub const TRACKER_MAP_PLACEHOLDER: &str = "tracker url:site tag";

/// Prompt text shown as the save-path map default; parses to no rules.
pub const SAVE_PATH_MAP_PLACEHOLDER: &str = "save path:tag";

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tagging: TaggingConfig,
    #[serde(default)]
    pub downloaders: Vec<DownloaderConfig>,
    #[serde(default)]
    pub sites: SitesConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Tagging behavior configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaggingConfig {
    /// Enable/disable tagging runs entirely.
    #[serde(default)]
    pub enabled: bool,

    /// Overwrite mode: replace the relevant tag set each run instead
    /// of only adding missing tags.
    #[serde(default)]
    pub overwrite: bool,

    /// Put the site tag first in the submitted label list, for
    /// replace-only backends in overwrite mode.
    #[serde(default)]
    pub site_first: bool,

    /// Free-text tracker map, one `substring:site tag` per line.
    #[serde(default = "default_tracker_map")]
    pub tracker_map: String,

    /// Free-text save-path map, one `substring:tag` per line.
    #[serde(default = "default_save_path_map")]
    pub save_path_map: String,

    /// Names of the configured downloaders this job should process,
    /// in processing order.
    #[serde(default)]
    pub downloaders: Vec<String>,
}

impl TaggingConfig {
    /// The run-wide resolution policy implied by `overwrite`.
    pub fn policy(&self) -> ResolutionPolicy {
        if self.overwrite {
            ResolutionPolicy::Overwrite
        } else {
            ResolutionPolicy::Additive
        }
    }
}

impl Default for TaggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            overwrite: false,
            site_first: false,
            tracker_map: default_tracker_map(),
            save_path_map: default_save_path_map(),
            downloaders: Vec::new(),
        }
    }
}

fn default_tracker_map() -> String {
    TRACKER_MAP_PLACEHOLDER.to_string()
}

fn default_save_path_map() -> String {
    SAVE_PATH_MAP_PLACEHOLDER.to_string()
}

/// One downloader backend instance
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Unique instance name, referenced by `tagging.downloaders`.
    pub name: String,
    /// Backend type.
    pub backend: DownloaderBackend,
    /// Base URL (qBittorrent WebUI or Transmission RPC).
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

#[cfg(test)]
impl DownloaderConfig {
    /// Minimal config for client unit tests.
    pub(crate) fn for_tests(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            backend: DownloaderBackend::Transmission,
            url: url.to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

/// Available downloader backends
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DownloaderBackend {
    QBittorrent,
    Transmission,
}

/// Known-site directory configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SitesConfig {
    #[serde(default)]
    pub known: Vec<SiteEntry>,
}

/// One known site: canonical name plus its tracker domains
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SiteEntry {
    pub name: String,
    #[serde(default)]
    pub domains: Vec<String>,
}

/// Scheduling configuration (fixed interval only; cron belongs to an
/// external scheduler)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScheduleConfig {
    /// Seconds between scheduled runs.
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    /// Run once immediately on startup.
    #[serde(default)]
    pub run_on_start: bool,
    /// Poll interval in seconds for detecting freshly added torrents;
    /// 0 disables the watcher.
    #[serde(default)]
    pub watch_secs: u64,
}

impl ScheduleConfig {
    /// Minimum interval between runs, so back-to-back runs cannot pile
    /// up against slow backends.
    pub const MIN_INTERVAL_SECS: u64 = 300;

    /// Configured interval clamped to the floor.
    pub fn effective_interval_secs(&self) -> u64 {
        self.interval_secs.max(Self::MIN_INTERVAL_SECS)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            run_on_start: false,
            watch_secs: 0,
        }
    }
}

fn default_interval() -> u64 {
    86_400 // daily
}

/// Sanitized config for logging/diagnostics (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub tagging: TaggingConfig,
    pub downloaders: Vec<SanitizedDownloaderConfig>,
    pub sites: SitesConfig,
    pub schedule: ScheduleConfig,
}

/// Sanitized downloader config (password hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloaderConfig {
    pub name: String,
    pub backend: DownloaderBackend,
    pub url: String,
    pub username: String,
    pub password_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            tagging: config.tagging.clone(),
            downloaders: config
                .downloaders
                .iter()
                .map(|d| SanitizedDownloaderConfig {
                    name: d.name.clone(),
                    backend: d.backend,
                    url: d.url.clone(),
                    username: d.username.clone(),
                    password_configured: !d.password.is_empty(),
                    timeout_secs: d.timeout_secs,
                })
                .collect(),
            sites: config.sites.clone(),
            schedule: config.schedule.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert!(!config.tagging.enabled);
        assert_eq!(config.tagging.tracker_map, TRACKER_MAP_PLACEHOLDER);
        assert_eq!(config.tagging.save_path_map, SAVE_PATH_MAP_PLACEHOLDER);
        assert!(config.downloaders.is_empty());
        assert_eq!(config.schedule.interval_secs, 86_400);
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[tagging]
enabled = true
overwrite = true
site_first = true
tracker_map = "tracker.sitex.org:SiteX"
save_path_map = "/mnt/keep:keep"
downloaders = ["qb-main", "tr-seed"]

[[downloaders]]
name = "qb-main"
backend = "q_bittorrent"
url = "http://localhost:8080"
username = "admin"
password = "secret"

[[downloaders]]
name = "tr-seed"
backend = "transmission"
url = "http://localhost:9091"

[[sites.known]]
name = "SiteX"
domains = ["sitex.org"]

[schedule]
interval_secs = 3600
run_on_start = true
watch_secs = 30
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(config.tagging.enabled);
        assert_eq!(config.tagging.policy(), ResolutionPolicy::Overwrite);
        assert_eq!(config.downloaders.len(), 2);
        assert_eq!(config.downloaders[0].backend, DownloaderBackend::QBittorrent);
        assert_eq!(config.downloaders[1].backend, DownloaderBackend::Transmission);
        assert_eq!(config.downloaders[1].timeout_secs, 30); // default
        assert_eq!(config.sites.known[0].domains, vec!["sitex.org".to_string()]);
        assert!(config.schedule.run_on_start);
        assert_eq!(config.schedule.watch_secs, 30);
    }

    #[test]
    fn test_policy_default_is_additive() {
        let tagging = TaggingConfig::default();
        assert_eq!(tagging.policy(), ResolutionPolicy::Additive);
    }

    #[test]
    fn test_effective_interval_floor() {
        let schedule = ScheduleConfig {
            interval_secs: 10,
            ..ScheduleConfig::default()
        };
        assert_eq!(schedule.effective_interval_secs(), 300);

        let schedule = ScheduleConfig {
            interval_secs: 3600,
            ..ScheduleConfig::default()
        };
        assert_eq!(schedule.effective_interval_secs(), 3600);
    }

    #[test]
    fn test_sanitized_config_hides_password() {
        let toml = r#"
[[downloaders]]
name = "qb"
backend = "q_bittorrent"
url = "http://localhost:8080"
username = "admin"
password = "hunter2"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.downloaders[0].password_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("hunter2"));
    }
}
