//! Literature source clients.
//!
//! This module defines the [`Source`] trait that each external literature API
//! implements. A source turns a free-text query into at most `max_results`
//! [`Article`]s, normalizing whatever response shape its API uses.
//!
//! # Sources
//!
//! - [`PubMedSource`] - NCBI E-utilities: esearch, then esummary (title) and
//!   efetch (abstract) per record
//! - [`EuropePmcSource`] - Europe PMC REST search, one call
//! - [`ArxivSource`] - arXiv Atom query API, one call
//! - [`PmcSource`] - NCBI E-utilities on PubMed Central: esearch, then
//!   esummary per record
//!
//! # Failure policy
//!
//! A failure while resolving one record (network error, missing summary,
//! malformed XML) is logged and that record is skipped or its field left
//! empty. Only the top-level search call is allowed to fail the whole
//! source; the aggregator decides what to do with that.

mod arxiv;
mod europe_pmc;
mod eutils;
pub mod mock;
mod pmc;
mod pubmed;
mod registry;

pub use arxiv::ArxivSource;
pub use europe_pmc::EuropePmcSource;
pub use mock::MockSource;
pub use pmc::PmcSource;
pub use pubmed::PubMedSource;
pub use registry::SourceRegistry;

use crate::models::{Article, SourceKind};
use async_trait::async_trait;

/// Interface implemented by every literature source.
#[async_trait]
pub trait Source: Send + Sync + std::fmt::Debug {
    /// Which database this source queries
    fn kind(&self) -> SourceKind;

    /// Unique identifier for this source (e.g., "arxiv", "pubmed")
    fn id(&self) -> &str {
        self.kind().id()
    }

    /// Human-readable name of this source
    fn name(&self) -> &str {
        self.kind().name()
    }

    /// Search for articles matching the query, returning at most `max_results`
    async fn fetch(&self, query: &str, max_results: usize) -> Result<Vec<Article>, SourceError>;
}

/// Errors that can occur when interacting with a source
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// Network or connection error
    #[error("Network error: {0}")]
    Network(String),

    /// The request did not complete in time
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Parsing error (XML, JSON, Atom)
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unsuccessful HTTP status
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded")]
    RateLimit,

    /// Invalid request parameters or configuration
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Other error
    #[error("Error: {0}")]
    Other(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Timeout(err.to_string())
        } else if err.is_decode() {
            SourceError::Parse(err.to_string())
        } else {
            SourceError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::Parse(format!("JSON: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_parse_error() {
        let err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(SourceError::from(err), SourceError::Parse(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SourceError::Http {
            status: 500,
            message: "500 Internal Server Error".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP 500: 500 Internal Server Error");
    }
}
