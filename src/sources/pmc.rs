//! PubMed Central source implementation using the E-utilities API.

use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;

use crate::models::{Article, SourceKind};
use crate::sources::eutils::{self, EUTILS_BASE_URL};
use crate::sources::{Source, SourceError};
use crate::utils::{collapse_whitespace, HttpClient, RetryConfig};

/// PubMed Central literature source
///
/// Searches `db=pmc` and reads each record's esummary. The summary carries no
/// abstract, so its `elocationid` field (normally a DOI) stands in for it.
#[derive(Debug, Clone)]
pub struct PmcSource {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl PmcSource {
    /// Create a new PMC source
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            base_url: EUTILS_BASE_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the source at a different E-utilities base URL
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the retry policy for the esearch call
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_record(&self, id: &str) -> Option<Article> {
        match eutils::fetch_summary(&self.client, &self.base_url, "pmc", id).await {
            Ok(Some(summary)) => Some(Article::new(
                collapse_whitespace(&summary.title),
                summary.elocationid,
                SourceKind::PubMedCentral,
            )),
            Ok(None) => {
                tracing::debug!(id, "No PMC summary, skipping record");
                None
            }
            Err(e) => {
                tracing::warn!(id, "PMC summary lookup failed: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl Source for PmcSource {
    fn kind(&self) -> SourceKind {
        SourceKind::PubMedCentral
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Article>, SourceError> {
        let ids =
            eutils::search_ids(&self.client, &self.base_url, "pmc", query, max_results, self.retry)
                .await?;

        let lookups = ids.iter().take(max_results).map(|id| self.fetch_record(id));
        Ok(join_all(lookups).await.into_iter().flatten().collect())
    }
}
