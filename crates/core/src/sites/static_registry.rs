//! Configuration-backed site registry.

use async_trait::async_trait;

use crate::config::SiteEntry;

use super::{SiteRegistry, SiteRegistryError};

/// Site registry built from `[sites]` configuration entries.
///
/// Domain matching is suffix-based so that `tracker.example.org`
/// resolves against a registered `example.org`.
pub struct StaticSiteRegistry {
    entries: Vec<SiteEntry>,
}

impl StaticSiteRegistry {
    pub fn new(entries: Vec<SiteEntry>) -> Self {
        Self { entries }
    }

    fn domain_matches(registered: &str, domain: &str) -> bool {
        let registered = registered.to_ascii_lowercase();
        domain == registered || domain.ends_with(&format!(".{registered}"))
    }
}

#[async_trait]
impl SiteRegistry for StaticSiteRegistry {
    async fn known_site_names(&self) -> Result<Vec<String>, SiteRegistryError> {
        Ok(self.entries.iter().map(|e| e.name.clone()).collect())
    }

    async fn lookup_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<String>, SiteRegistryError> {
        let domain = domain.to_ascii_lowercase();
        for entry in &self.entries {
            if entry
                .domains
                .iter()
                .any(|registered| Self::domain_matches(registered, &domain))
            {
                return Ok(Some(entry.name.clone()));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> StaticSiteRegistry {
        StaticSiteRegistry::new(vec![
            SiteEntry {
                name: "SiteX".to_string(),
                domains: vec!["sitex.org".to_string()],
            },
            SiteEntry {
                name: "SiteY".to_string(),
                domains: vec!["sitey.net".to_string(), "sitey-backup.com".to_string()],
            },
        ])
    }

    #[tokio::test]
    async fn test_known_site_names() {
        let names = registry().known_site_names().await.unwrap();
        assert_eq!(names, vec!["SiteX".to_string(), "SiteY".to_string()]);
    }

    #[tokio::test]
    async fn test_lookup_exact_domain() {
        let site = registry().lookup_by_domain("sitex.org").await.unwrap();
        assert_eq!(site, Some("SiteX".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_subdomain() {
        let site = registry()
            .lookup_by_domain("tracker.sitey.net")
            .await
            .unwrap();
        assert_eq!(site, Some("SiteY".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_alternate_domain() {
        let site = registry()
            .lookup_by_domain("sitey-backup.com")
            .await
            .unwrap();
        assert_eq!(site, Some("SiteY".to_string()));
    }

    #[tokio::test]
    async fn test_lookup_unknown_domain() {
        let site = registry().lookup_by_domain("nowhere.xyz").await.unwrap();
        assert_eq!(site, None);
    }

    #[tokio::test]
    async fn test_suffix_match_requires_dot_boundary() {
        // "evilsitex.org" must not match the registered "sitex.org".
        let site = registry().lookup_by_domain("evilsitex.org").await.unwrap();
        assert_eq!(site, None);
    }
}
