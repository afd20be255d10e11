//! Shared plumbing for the NCBI E-utilities (PubMed and PubMed Central).

use serde::Deserialize;
use std::collections::HashMap;

use crate::sources::SourceError;
use crate::utils::{encode_query, with_retry, HttpClient, RetryConfig};

/// NCBI E-utilities base URL
pub(crate) const EUTILS_BASE_URL: &str = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils";

/// Build an esearch URL returning a JSON id list
pub(crate) fn esearch_url(base: &str, db: &str, term: &str, retmax: usize) -> String {
    format!(
        "{}/esearch.fcgi?{}",
        base,
        encode_query(&[
            ("db", db),
            ("retmode", "json"),
            ("term", term),
            ("retmax", &retmax.to_string()),
        ])
    )
}

/// Build an esummary URL for one record
pub(crate) fn esummary_url(base: &str, db: &str, id: &str) -> String {
    format!(
        "{}/esummary.fcgi?{}",
        base,
        encode_query(&[("db", db), ("id", id), ("retmode", "json")])
    )
}

/// Build an efetch URL returning the full XML record
pub(crate) fn efetch_url(base: &str, db: &str, id: &str) -> String {
    format!(
        "{}/efetch.fcgi?{}",
        base,
        encode_query(&[("db", db), ("id", id), ("retmode", "xml")])
    )
}

/// Run esearch and return the matching record ids
///
/// This is the top-level call for both E-utilities sources, so it is retried
/// on transient errors and its failure fails the source.
pub(crate) async fn search_ids(
    client: &HttpClient,
    base: &str,
    db: &str,
    term: &str,
    retmax: usize,
    retry: RetryConfig,
) -> Result<Vec<String>, SourceError> {
    let url = esearch_url(base, db, term, retmax);

    let response: ESearchResponse = with_retry(retry, || {
        let url = url.clone();
        async move {
            client.throttle_ncbi().await;
            client.get_json(&url).await
        }
    })
    .await?;

    Ok(response.esearchresult.idlist)
}

/// Fetch the document summary for one record
///
/// Returns `Ok(None)` when the response has no usable entry for `id`.
pub(crate) async fn fetch_summary(
    client: &HttpClient,
    base: &str,
    db: &str,
    id: &str,
) -> Result<Option<DocSummary>, SourceError> {
    client.throttle_ncbi().await;
    let response: ESummaryResponse = client.get_json(&esummary_url(base, db, id)).await?;

    let Some(entry) = response.result.and_then(|mut result| result.remove(id)) else {
        return Ok(None);
    };

    let summary: DocSummary = serde_json::from_value(entry)?;
    if let Some(error) = &summary.error {
        tracing::debug!(db, id, error, "esummary returned an error entry");
        return Ok(None);
    }

    Ok(Some(summary))
}

// ===== E-utilities API Types =====

#[derive(Debug, Deserialize)]
struct ESearchResponse {
    esearchresult: ESearchResult,
}

#[derive(Debug, Deserialize)]
struct ESearchResult {
    #[serde(default)]
    idlist: Vec<String>,
}

/// `result` maps each uid to its summary, next to a `uids` array
#[derive(Debug, Deserialize)]
struct ESummaryResponse {
    #[serde(default)]
    result: Option<HashMap<String, serde_json::Value>>,
}

/// The summary fields the sources use
#[derive(Debug, Default, Deserialize)]
pub(crate) struct DocSummary {
    #[serde(default)]
    pub title: String,

    /// Electronic location (usually a DOI string)
    #[serde(default)]
    pub elocationid: String,

    #[serde(default)]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esearch_url() {
        let url = esearch_url(EUTILS_BASE_URL, "pubmed", "obesity diabetes", 5);
        assert!(url.starts_with("https://eutils.ncbi.nlm.nih.gov/entrez/eutils/esearch.fcgi?"));
        assert!(url.contains("db=pubmed"));
        assert!(url.contains("term=obesity%20diabetes"));
        assert!(url.contains("retmax=5"));
        assert!(url.contains("retmode=json"));
    }

    #[test]
    fn test_esummary_and_efetch_urls() {
        assert!(esummary_url("http://x", "pmc", "123").ends_with("esummary.fcgi?db=pmc&id=123&retmode=json"));
        assert!(efetch_url("http://x", "pubmed", "9").ends_with("efetch.fcgi?db=pubmed&id=9&retmode=xml"));
    }

    #[test]
    fn test_summary_parsing() {
        let value = serde_json::json!({
            "uid": "42",
            "title": "A title",
            "elocationid": "doi: 10.1000/x"
        });
        let summary: DocSummary = serde_json::from_value(value).unwrap();
        assert_eq!(summary.title, "A title");
        assert_eq!(summary.elocationid, "doi: 10.1000/x");
        assert!(summary.error.is_none());
    }
}
