//! EuropePMC source implementation using their REST API.
//!
//! EuropePMC indexes PubMed, PMC, and preprints from bioRxiv/medRxiv.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use crate::models::{Article, SourceKind};
use crate::sources::{Source, SourceError};
use crate::utils::{encode_query, with_retry, HttpClient, RetryConfig};

/// EuropePMC REST API search URL
const EUROPE_PMC_SEARCH_URL: &str = "https://www.ebi.ac.uk/europepmc/webservices/rest/search";

/// EuropePMC literature source
///
/// One search call returns titles and abstracts together. The `core` result
/// type is requested because the default `lite` view carries no abstract.
#[derive(Debug, Clone)]
pub struct EuropePmcSource {
    client: Arc<HttpClient>,
    search_url: String,
    retry: RetryConfig,
}

impl EuropePmcSource {
    /// Create a new EuropePMC source
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            search_url: EUROPE_PMC_SEARCH_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the source at a different search endpoint
    pub fn with_search_url(mut self, url: impl Into<String>) -> Self {
        self.search_url = url.into();
        self
    }

    /// Set the retry policy for the search call
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build search URL
    fn build_search_url(&self, query: &str, max_results: usize) -> String {
        format!(
            "{}?{}",
            self.search_url,
            encode_query(&[
                ("query", query),
                ("format", "json"),
                ("resultType", "core"),
                ("pageSize", &max_results.to_string()),
            ])
        )
    }

    /// Turn the raw hits into articles, skipping hits that do not deserialize
    fn parse_hits(response: SearchResponse) -> Vec<Article> {
        response
            .result_list
            .result
            .into_iter()
            .filter_map(|hit| match serde_json::from_value::<Hit>(hit) {
                Ok(hit) => Some(Article::new(
                    hit.title.unwrap_or_default(),
                    hit.abstract_text.unwrap_or_default(),
                    SourceKind::EuropePmc,
                )),
                Err(e) => {
                    tracing::debug!("Skipping malformed EuropePMC hit: {}", e);
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl Source for EuropePmcSource {
    fn kind(&self) -> SourceKind {
        SourceKind::EuropePmc
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Article>, SourceError> {
        let url = self.build_search_url(query, max_results);
        let client = Arc::clone(&self.client);

        let response: SearchResponse = with_retry(self.retry, || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move { client.get_json(&url).await }
        })
        .await?;

        let mut articles = Self::parse_hits(response);
        articles.truncate(max_results);

        tracing::debug!(count = articles.len(), "EuropePMC search complete");
        Ok(articles)
    }
}

// ===== EuropePMC API Types =====

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResponse {
    #[serde(default)]
    result_list: ResultList,
}

#[derive(Debug, Default, Deserialize)]
struct ResultList {
    #[serde(default)]
    result: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Hit {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    abstract_text: Option<String>,
}
