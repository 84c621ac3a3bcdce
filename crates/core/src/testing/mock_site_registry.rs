//! Mock site registry for testing.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::sites::{SiteRegistry, SiteRegistryError};

/// Mock implementation of the [`SiteRegistry`] trait.
///
/// Built with a fixed set of known site names and exact-domain mappings;
/// `with_lookup_failure` turns every domain lookup into an error to
/// exercise degradation paths.
#[derive(Debug, Default)]
pub struct MockSiteRegistry {
    names: Vec<String>,
    domains: HashMap<String, String>,
    fail_lookups: bool,
}

impl MockSiteRegistry {
    /// Create a registry knowing the given canonical site names.
    pub fn new(names: Vec<String>) -> Self {
        Self {
            names,
            domains: HashMap::new(),
            fail_lookups: false,
        }
    }

    /// Map a tracker domain to a site name.
    pub fn with_domain(mut self, domain: &str, site: &str) -> Self {
        self.domains.insert(domain.to_string(), site.to_string());
        self
    }

    /// Make every domain lookup fail.
    pub fn with_lookup_failure(mut self) -> Self {
        self.fail_lookups = true;
        self
    }
}

#[async_trait]
impl SiteRegistry for MockSiteRegistry {
    async fn known_site_names(&self) -> Result<Vec<String>, SiteRegistryError> {
        Ok(self.names.clone())
    }

    async fn lookup_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<String>, SiteRegistryError> {
        if self.fail_lookups {
            return Err(SiteRegistryError::LookupFailed("mock failure".to_string()));
        }
        Ok(self
            .domains
            .iter()
            .find(|(registered, _)| {
                domain == registered.as_str()
                    || domain
                        .strip_suffix(registered.as_str())
                        .is_some_and(|prefix| prefix.ends_with('.'))
            })
            .map(|(_, site)| site.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subdomain_matches() {
        let registry = MockSiteRegistry::new(vec![]).with_domain("sitex.org", "SiteX");
        assert_eq!(
            registry.lookup_by_domain("tracker.sitex.org").await.unwrap(),
            Some("SiteX".to_string())
        );
        assert_eq!(
            registry.lookup_by_domain("sitex.org").await.unwrap(),
            Some("SiteX".to_string())
        );
        // No dot boundary: must not match.
        assert_eq!(registry.lookup_by_domain("notsitex.org").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lookup_failure() {
        let registry = MockSiteRegistry::new(vec![]).with_lookup_failure();
        assert!(registry.lookup_by_domain("sitex.org").await.is_err());
    }
}
