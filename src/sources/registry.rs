//! Registry of the configured literature sources.

use std::sync::Arc;

use super::{ArxivSource, EuropePmcSource, PmcSource, PubMedSource, Source, SourceError};
use crate::config::Config;
use crate::models::SourceKind;
use crate::utils::{HttpClient, RetryConfig};

/// The set of sources a search fans out to
///
/// Sources are kept sorted by [`SourceKind`], so iteration (and therefore
/// the merge order of results) is always PubMed, EuropePMC, arXiv, PubMed
/// Central no matter the order they were registered or configured in.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry of enabled sources from configuration
    ///
    /// All sources share one [`HttpClient`], and with it the NCBI rate limit.
    pub fn from_config(config: &Config) -> Result<Self, SourceError> {
        let client = Arc::new(HttpClient::new(&config.http)?);
        let retry = RetryConfig::from(&config.retry);
        let endpoints = &config.sources.endpoints;

        let mut registry = Self::new();

        for id in &config.sources.enabled {
            let kind = SourceKind::from_id(id).ok_or_else(|| {
                SourceError::InvalidRequest(format!(
                    "Unknown source '{}' (expected one of: {})",
                    id,
                    SourceKind::ALL.map(|k| k.id()).join(", ")
                ))
            })?;

            if registry.has(kind) {
                continue;
            }

            let source: Arc<dyn Source> = match kind {
                SourceKind::PubMed => Arc::new(
                    PubMedSource::new(Arc::clone(&client))
                        .with_base_url(&endpoints.eutils_base_url)
                        .with_retry(retry),
                ),
                SourceKind::EuropePmc => Arc::new(
                    EuropePmcSource::new(Arc::clone(&client))
                        .with_search_url(&endpoints.europe_pmc_search_url)
                        .with_retry(retry),
                ),
                SourceKind::Arxiv => Arc::new(
                    ArxivSource::new(Arc::clone(&client))
                        .with_query_url(&endpoints.arxiv_query_url)
                        .with_retry(retry),
                ),
                SourceKind::PubMedCentral => Arc::new(
                    PmcSource::new(Arc::clone(&client))
                        .with_base_url(&endpoints.eutils_base_url)
                        .with_retry(retry),
                ),
            };
            registry.register(source);
        }

        tracing::debug!(sources = ?registry.ids().collect::<Vec<_>>(), "Source registry built");
        Ok(registry)
    }

    /// Register a new source, keeping declared source order
    pub fn register(&mut self, source: Arc<dyn Source>) {
        self.sources.push(source);
        self.sources.sort_by_key(|s| s.kind());
    }

    /// Get the first source of a kind
    pub fn get(&self, kind: SourceKind) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.kind() == kind)
    }

    /// Get all registered sources, in declared order
    pub fn all(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Get all source IDs
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|s| s.id())
    }

    /// Check if a source of this kind is registered
    pub fn has(&self, kind: SourceKind) -> bool {
        self.get(kind).is_some()
    }

    /// Get the number of registered sources
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockSource;

    #[test]
    fn test_registry_from_default_config() {
        let registry = SourceRegistry::from_config(&Config::default()).unwrap();

        assert_eq!(registry.len(), 4);
        assert!(!registry.is_empty());
        assert_eq!(
            registry.ids().collect::<Vec<_>>(),
            vec!["pubmed", "europe_pmc", "arxiv", "pmc"]
        );
    }

    #[test]
    fn test_enabled_order_does_not_change_merge_order() {
        let mut config = Config::default();
        config.sources.enabled = vec!["pmc".into(), "arxiv".into(), "pmc".into()];

        let registry = SourceRegistry::from_config(&config).unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["arxiv", "pmc"]);
        assert!(registry.has(SourceKind::Arxiv));
        assert!(!registry.has(SourceKind::PubMed));
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let mut config = Config::default();
        config.sources.enabled = vec!["scopus".into()];

        let err = SourceRegistry::from_config(&config).unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }

    #[test]
    fn test_register_sorts_by_kind() {
        let mut registry = SourceRegistry::new();
        registry.register(Arc::new(MockSource::new(SourceKind::PubMedCentral)));
        registry.register(Arc::new(MockSource::new(SourceKind::PubMed)));

        let kinds: Vec<_> = registry.all().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec![SourceKind::PubMed, SourceKind::PubMedCentral]);
        assert_eq!(registry.get(SourceKind::PubMed).unwrap().name(), "PubMed");
    }
}
