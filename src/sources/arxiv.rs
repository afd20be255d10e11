//! arXiv source implementation using the Atom query API.

use async_trait::async_trait;
use feed_rs::parser;
use std::sync::Arc;

use crate::models::{Article, SourceKind};
use crate::sources::{Source, SourceError};
use crate::utils::{collapse_whitespace, with_retry, HttpClient, RetryConfig};

/// arXiv API query URL
const ARXIV_API_URL: &str = "https://export.arxiv.org/api/query";

/// arXiv literature source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: Arc<HttpClient>,
    query_url: String,
    retry: RetryConfig,
}

impl ArxivSource {
    /// Create a new arXiv source
    pub fn new(client: Arc<HttpClient>) -> Self {
        Self {
            client,
            query_url: ARXIV_API_URL.to_string(),
            retry: RetryConfig::default(),
        }
    }

    /// Point the source at a different query endpoint
    pub fn with_query_url(mut self, url: impl Into<String>) -> Self {
        self.query_url = url.into();
        self
    }

    /// Set the retry policy for the query call
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Build the query URL, searching all fields
    fn build_search_url(&self, query: &str, max_results: usize) -> String {
        format!(
            "{}?search_query={}&start=0&max_results={}",
            self.query_url,
            urlencoding::encode(&format!("all:{}", query)),
            max_results
        )
    }

    /// Parse an Atom feed into articles
    ///
    /// Entries missing a title or a summary are dropped.
    fn parse_feed(body: &str) -> Result<Vec<Article>, SourceError> {
        let feed = parser::parse(body.as_bytes())
            .map_err(|e| SourceError::Parse(format!("Failed to parse Atom feed: {}", e)))?;

        let articles = feed
            .entries
            .into_iter()
            .filter_map(|entry| match (entry.title, entry.summary) {
                (Some(title), Some(summary)) => Some(Article::new(
                    collapse_whitespace(&title.content),
                    collapse_whitespace(&summary.content),
                    SourceKind::Arxiv,
                )),
                _ => {
                    tracing::debug!(id = %entry.id, "Skipping arXiv entry without title or summary");
                    None
                }
            })
            .collect();

        Ok(articles)
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Arxiv
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Article>, SourceError> {
        let url = self.build_search_url(query, max_results);
        let client = Arc::clone(&self.client);

        let body = with_retry(self.retry, || {
            let client = Arc::clone(&client);
            let url = url.clone();
            async move { client.get_text(&url).await }
        })
        .await?;

        let mut articles = Self::parse_feed(&body)?;
        articles.truncate(max_results);

        tracing::debug!(count = articles.len(), "arXiv search complete");
        Ok(articles)
    }
}
