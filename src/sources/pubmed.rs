//! PubMed source implementation using the E-utilities API.

use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;

use crate::models::{Article, SourceKind};
use crate::sources::eutils::{self, EUTILS_BASE_URL};
use crate::sources::{Source, SourceError};
use crate::utils::{collapse_whitespace, extract_element_text, Extraction, HttpClient, RetryConfig};

/// PubMed literature source
///
/// A search resolves PMIDs with esearch, then looks up each record: esummary
/// for the title and efetch for the abstract. Record lookups run
/// concurrently and share the client's NCBI rate limit.
#[derive(Debug, Clone)]
pub struct PubMedSource {
    client: Arc<HttpClient>,
    base_url: String,
    retry: RetryConfig,
}

impl PubMedSource {
    /// Create a new PubMed source
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

    /// Resolve one PMID into an article, or `None` if it has no summary
    async fn fetch_record(&self, pmid: &str) -> Option<Article> {
        let summary =
            match eutils::fetch_summary(&self.client, &self.base_url, "pubmed", pmid).await {
                Ok(Some(summary)) => summary,
                Ok(None) => {
                    tracing::debug!(pmid, "No PubMed summary, skipping record");
                    return None;
                }
                Err(e) => {
                    tracing::warn!(pmid, "PubMed summary lookup failed: {}", e);
                    return None;
                }
            };

        let abstract_text = self.fetch_abstract(pmid).await;
        Some(Article::new(
            collapse_whitespace(&summary.title),
            abstract_text,
            SourceKind::PubMed,
        ))
    }

    /// Fetch the abstract for one PMID, degrading to an empty string
    async fn fetch_abstract(&self, pmid: &str) -> String {
        self.client.throttle_ncbi().await;

        let url = eutils::efetch_url(&self.base_url, "pubmed", pmid);
        let xml = match self.client.get_text(&url).await {
            Ok(xml) => xml,
            Err(e) => {
                tracing::warn!(pmid, "PubMed efetch failed: {}", e);
                return String::new();
            }
        };

        let extraction = extract_element_text(&xml, "Abstract");
        match &extraction {
            Extraction::Found(_) => {}
            Extraction::Missing => tracing::debug!(pmid, "PubMed record has no abstract"),
            Extraction::Failed(reason) => {
                tracing::warn!(pmid, "Could not parse PubMed abstract: {}", reason)
            }
        }
        extraction.into_text()
    }
}

#[async_trait]
impl Source for PubMedSource {
    fn kind(&self) -> SourceKind {
        SourceKind::PubMed
    }

    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Article>, SourceError> {
        let ids = eutils::search_ids(
            &self.client,
            &self.base_url,
            "pubmed",
            query,
            max_results,
            self.retry,
        )
        .await?;

        tracing::debug!(count = ids.len(), "PubMed esearch returned ids");

        let lookups = ids.iter().take(max_results).map(|id| self.fetch_record(id));
        let articles: Vec<Article> = join_all(lookups).await.into_iter().flatten().collect();

        Ok(articles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpConfig;
    use mockito::Matcher;

    fn test_client() -> Arc<HttpClient> {
        let config = HttpConfig {
            ncbi_requests_per_second: 0,
            ..HttpConfig::default()
        };
        Arc::new(HttpClient::new(&config).unwrap())
    }

    fn id_query(id: &str) -> Matcher {
        Matcher::UrlEncoded("id".into(), id.into())
    }

    #[tokio::test]
    async fn test_fetch_resolves_title_and_abstract() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("db".into(), "pubmed".into()),
                Matcher::UrlEncoded("term".into(), "obesity diabetes".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"esearchresult": {"count": "2", "idlist": ["111", "222"]}}"#)
            .create_async()
            .await;

        let _summary_111 = server
            .mock("GET", "/esummary.fcgi")
            .match_query(id_query("111"))
            .with_status(200)
            .with_body(r#"{"result": {"uids": ["111"], "111": {"uid": "111", "title": "Obesity and insulin"}}}"#)
            .create_async()
            .await;

        let _summary_222 = server
            .mock("GET", "/esummary.fcgi")
            .match_query(id_query("222"))
            .with_status(200)
            .with_body(r#"{"result": {"uids": ["222"], "222": {"uid": "222", "title": "Beta cell failure"}}}"#)
            .create_async()
            .await;

        let _fetch_111 = server
            .mock("GET", "/efetch.fcgi")
            .match_query(id_query("111"))
            .with_status(200)
            .with_body(
                "<PubmedArticleSet><PubmedArticle><Abstract>\
                 <AbstractText>Adiposity drives <i>insulin</i> resistance.</AbstractText>\
                 </Abstract></PubmedArticle></PubmedArticleSet>",
            )
            .create_async()
            .await;

        // Malformed XML: the record survives with an empty abstract
        let _fetch_222 = server
            .mock("GET", "/efetch.fcgi")
            .match_query(id_query("222"))
            .with_status(200)
            .with_body("<PubmedArticleSet><Abstract><AbstractText>truncated")
            .create_async()
            .await;

        let source = PubMedSource::new(test_client()).with_base_url(server.url());
        let articles = source.fetch("obesity diabetes", 5).await.unwrap();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Obesity and insulin");
        assert_eq!(articles[0].r#abstract, "Adiposity drives insulin resistance.");
        assert_eq!(articles[0].source, SourceKind::PubMed);
        assert_eq!(articles[1].title, "Beta cell failure");
        assert_eq!(articles[1].r#abstract, "");
    }

    #[tokio::test]
    async fn test_record_without_summary_is_skipped() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult": {"idlist": ["333"]}}"#)
            .create_async()
            .await;

        let _summary = server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": {"uids": []}}"#)
            .create_async()
            .await;

        let fetch = server
            .mock("GET", "/efetch.fcgi")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let source = PubMedSource::new(test_client()).with_base_url(server.url());
        let articles = source.fetch("rare", 5).await.unwrap();

        assert!(articles.is_empty());
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_efetch_degrades_to_empty_abstract() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"esearchresult": {"idlist": ["444"]}}"#)
            .create_async()
            .await;

        let _summary = server
            .mock("GET", "/esummary.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"result": {"444": {"title": "Only a title"}}}"#)
            .create_async()
            .await;

        let _fetch = server
            .mock("GET", "/efetch.fcgi")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let source = PubMedSource::new(test_client()).with_base_url(server.url());
        let articles = source.fetch("title only", 5).await.unwrap();

        assert_eq!(articles, vec![Article::new("Only a title", "", SourceKind::PubMed)]);
    }

    #[tokio::test]
    async fn test_esearch_error_fails_source() {
        let mut server = mockito::Server::new_async().await;

        let _search = server
            .mock("GET", "/esearch.fcgi")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": "API rate limit exceeded"}"#)
            .create_async()
            .await;

        let source = PubMedSource::new(test_client())
            .with_base_url(server.url())
            .with_retry(RetryConfig::no_retry());

        let err = source.fetch("anything", 5).await.unwrap_err();
        assert!(matches!(err, SourceError::Parse(_)));
    }
}
