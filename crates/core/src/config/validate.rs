use std::collections::HashSet;

use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Downloader names are unique and non-empty
/// - When tagging is enabled, every selected downloader is defined
/// - Schedule interval is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut names = HashSet::new();
    for downloader in &config.downloaders {
        if downloader.name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "downloader name cannot be empty".to_string(),
            ));
        }
        if !names.insert(downloader.name.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate downloader name: {}",
                downloader.name
            )));
        }
        if downloader.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "downloader {} has an empty url",
                downloader.name
            )));
        }
    }

    if config.tagging.enabled {
        if config.tagging.downloaders.is_empty() {
            return Err(ConfigError::ValidationError(
                "tagging is enabled but tagging.downloaders is empty".to_string(),
            ));
        }
        for selected in &config.tagging.downloaders {
            if !names.contains(selected.as_str()) {
                return Err(ConfigError::ValidationError(format!(
                    "tagging.downloaders references undefined downloader: {}",
                    selected
                )));
            }
        }
    }

    if config.schedule.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "schedule.interval_secs cannot be 0".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn valid_toml() -> &'static str {
        r#"
[tagging]
enabled = true
downloaders = ["qb"]

[[downloaders]]
name = "qb"
backend = "q_bittorrent"
url = "http://localhost:8080"
"#
    }

    #[test]
    fn test_validate_valid_config() {
        let config = load_config_from_str(valid_toml()).unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_disabled_without_downloaders_ok() {
        let config = load_config_from_str("").unwrap();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_enabled_without_selection_fails() {
        let toml = r#"
[tagging]
enabled = true

[[downloaders]]
name = "qb"
backend = "q_bittorrent"
url = "http://localhost:8080"
"#;
        let config = load_config_from_str(toml).unwrap();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_undefined_selection_fails() {
        let toml = r#"
[tagging]
enabled = true
downloaders = ["missing"]

[[downloaders]]
name = "qb"
backend = "q_bittorrent"
url = "http://localhost:8080"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_names_fail() {
        let toml = r#"
[[downloaders]]
name = "qb"
backend = "q_bittorrent"
url = "http://a"

[[downloaders]]
name = "qb"
backend = "transmission"
url = "http://b"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_zero_interval_fails() {
        let toml = r#"
[schedule]
interval_secs = 0
"#;
        let config = load_config_from_str(toml).unwrap();
        assert!(validate_config(&config).is_err());
    }
}
