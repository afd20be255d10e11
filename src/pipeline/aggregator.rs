//! Concurrent fan-out over every registered source.

use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;

use crate::config::SourcesConfig;
use crate::models::{Article, SourceReport};
use crate::sources::SourceRegistry;

/// Articles merged from all sources, plus what happened to each source
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Articles in declared source order, each source's internal order kept
    pub articles: Vec<Article>,
    /// One report per registered source, in the same order
    pub reports: Vec<SourceReport>,
}

/// Queries every source concurrently and merges the results
///
/// A source that errors or exceeds its deadline contributes no articles and a
/// failed report; the others are unaffected.
#[derive(Debug, Clone)]
pub struct Aggregator {
    registry: SourceRegistry,
    max_results: usize,
    source_timeout: Duration,
}

impl Aggregator {
    /// Create an aggregator with default limits (5 results, 60s per source)
    pub fn new(registry: SourceRegistry) -> Self {
        Self::from_config(registry, &SourcesConfig::default())
    }

    /// Create an aggregator using the configured limits
    pub fn from_config(registry: SourceRegistry, config: &SourcesConfig) -> Self {
        Self {
            registry,
            max_results: config.max_results,
            source_timeout: Duration::from_secs(config.source_timeout_secs),
        }
    }

    /// Set the per-source result limit
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    /// Set the deadline for one source's whole fetch
    pub fn with_source_timeout(mut self, timeout: Duration) -> Self {
        self.source_timeout = timeout;
        self
    }

    /// Fetch from all sources concurrently
    ///
    /// Never fails: if every source fails the aggregation is simply empty,
    /// with the failures recorded in `reports`.
    pub async fn fetch_all(&self, query: &str) -> Aggregation {
        let futures = self.registry.all().map(|source| {
            let source = Arc::clone(source);
            async move {
                let outcome =
                    tokio::time::timeout(self.source_timeout, source.fetch(query, self.max_results))
                        .await;
                (source, outcome)
            }
        });

        let outcomes = join_all(futures).await;

        let mut aggregation = Aggregation::default();

        for (source, outcome) in outcomes {
            let kind = source.kind();
            match outcome {
                Ok(Ok(mut articles)) => {
                    articles.truncate(self.max_results);
                    tracing::debug!(source = %kind, count = articles.len(), "source returned articles");
                    aggregation.reports.push(SourceReport::ok(kind, articles.len()));
                    aggregation.articles.extend(articles);
                }
                Ok(Err(err)) => {
                    tracing::warn!(source = %kind, error = %err, "source query failed");
                    aggregation.reports.push(SourceReport::failed(kind, err.to_string()));
                }
                Err(_) => {
                    let message = format!("timed out after {:?}", self.source_timeout);
                    tracing::warn!(source = %kind, "source query {}", message);
                    aggregation.reports.push(SourceReport::failed(kind, message));
                }
            }
        }

        aggregation
    }
}
