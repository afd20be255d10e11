//! End-to-end search: fan out, merge, rank.

use std::sync::Arc;
use std::time::Instant;

use super::{Aggregation, Aggregator, Ranker, SearchError};
use crate::config::Config;
use crate::embedding::Embedder;
use crate::models::SearchResult;
use crate::sources::SourceRegistry;

/// Runs one search across all sources and ranks the merged articles
///
/// # Pipeline
///
/// 1. Blank queries short-circuit to an empty result, no network calls
/// 2. Fan out to every source concurrently ([`Aggregator::fetch_all`])
/// 3. If nothing came back, return an empty result without embedding
/// 4. Rank the merged articles against the query ([`Ranker::rank`])
#[derive(Debug, Clone)]
pub struct Orchestrator {
    aggregator: Aggregator,
    ranker: Ranker,
}

impl Orchestrator {
    pub fn new(aggregator: Aggregator, ranker: Ranker) -> Self {
        Self { aggregator, ranker }
    }

    /// Build the configured sources around a shared embedder
    pub fn from_config(config: &Config, embedder: Arc<dyn Embedder>) -> Result<Self, SearchError> {
        let registry = SourceRegistry::from_config(config)?;
        Ok(Self::new(
            Aggregator::from_config(registry, &config.sources),
            Ranker::new(embedder),
        ))
    }

    /// Search all sources for `query` and rank the results
    ///
    /// # Errors
    ///
    /// Only the embedding backend can fail a search. Source failures are
    /// reported per source in [`SearchResult::reports`].
    pub async fn search(&self, query: &str) -> Result<SearchResult, SearchError> {
        let query = query.trim();
        if query.is_empty() {
            tracing::debug!("blank query, skipping search");
            return Ok(SearchResult::empty(query));
        }

        let start = Instant::now();
        let Aggregation { articles, reports } = self.aggregator.fetch_all(query).await;
        tracing::info!(
            query,
            articles = articles.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "sources answered"
        );

        if articles.is_empty() {
            return Ok(SearchResult::empty(query).with_reports(reports));
        }

        let ranked = self.ranker.rank(articles, query).await?;
        tracing::info!(
            query,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "search complete"
        );

        Ok(SearchResult::new(query, ranked).with_reports(reports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::models::{Article, SourceKind};
    use crate::sources::MockSource;

    fn orchestrator(
        sources: Vec<Arc<MockSource>>,
        embedder: Arc<MockEmbedder>,
    ) -> Orchestrator {
        let mut registry = SourceRegistry::new();
        for source in sources {
            registry.register(source);
        }
        Orchestrator::new(Aggregator::new(registry), Ranker::new(embedder))
    }

    #[tokio::test]
    async fn test_blank_query_makes_no_calls() {
        let source = Arc::new(MockSource::with_titles(SourceKind::PubMed, &["a"]));
        let embedder = Arc::new(MockEmbedder::new(8));
        let orchestrator = orchestrator(vec![source.clone()], embedder.clone());

        for query in ["", "   ", "\n\t"] {
            let result = orchestrator.search(query).await.unwrap();
            assert!(result.is_empty());
        }

        assert_eq!(source.call_count(), 0);
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_articles_skips_ranking() {
        let sources = SourceKind::ALL
            .into_iter()
            .map(|kind| Arc::new(MockSource::new(kind)))
            .collect::<Vec<_>>();
        let embedder = Arc::new(MockEmbedder::failing("must not load"));
        let orchestrator = orchestrator(sources.clone(), embedder.clone());

        let result = orchestrator.search("nothing").await.unwrap();

        assert!(result.is_empty());
        assert_eq!(result.reports.len(), 4);
        assert!(sources.iter().all(|s| s.call_count() == 1));
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_fails_search() {
        let source = Arc::new(MockSource::with_titles(SourceKind::Arxiv, &["a"]));
        let orchestrator =
            orchestrator(vec![source], Arc::new(MockEmbedder::failing("offline")));

        let err = orchestrator.search("query").await.unwrap_err();
        assert!(matches!(err, SearchError::Embedding(_)));
    }

    #[tokio::test]
    async fn test_query_is_trimmed() {
        let source = Arc::new(MockSource::with_articles(
            SourceKind::EuropePmc,
            vec![Article::new("insulin", "", SourceKind::EuropePmc)],
        ));
        let orchestrator = orchestrator(vec![source], Arc::new(MockEmbedder::new(8)));

        let result = orchestrator.search("  insulin  ").await.unwrap();

        assert_eq!(result.query, "insulin");
        assert_eq!(result.len(), 1);
    }
}
