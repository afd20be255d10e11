//! HTTP client utilities.

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use crate::config::HttpConfig;
use crate::sources::SourceError;

/// Shared HTTP client with sensible defaults
///
/// Cloning is cheap; clones share the connection pool and the NCBI rate
/// limiter, so every PubMed and PMC request draws from one budget.
#[derive(Clone)]
pub struct HttpClient {
    client: Arc<Client>,
    ncbi_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl HttpClient {
    /// Create a new HTTP client from configuration
    pub fn new(config: &HttpConfig) -> Result<Self, SourceError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| SourceError::Other(format!("Failed to create HTTP client: {}", e)))?;

        let ncbi_limiter = NonZeroU32::new(config.ncbi_requests_per_second)
            .map(|rps| Arc::new(RateLimiter::direct(Quota::per_second(rps))));

        Ok(Self {
            client: Arc::new(client),
            ncbi_limiter,
        })
    }

    /// Wait for a slot in the NCBI request budget
    pub async fn throttle_ncbi(&self) {
        if let Some(limiter) = &self.ncbi_limiter {
            limiter.until_ready().await;
        }
    }

    /// GET a URL and return the body as text, mapping non-success statuses to errors
    pub async fn get_text(&self, url: &str) -> Result<String, SourceError> {
        tracing::debug!(url, "GET");

        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(status_error(status));
        }

        Ok(response.text().await?)
    }

    /// GET a URL and deserialize the JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let body = self.get_text(url).await?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("ncbi_rate_limited", &self.ncbi_limiter.is_some())
            .finish()
    }
}

/// Map an unsuccessful HTTP status to a source error
fn status_error(status: StatusCode) -> SourceError {
    if status == StatusCode::TOO_MANY_REQUESTS {
        return SourceError::RateLimit;
    }
    SourceError::Http {
        status: status.as_u16(),
        message: status.to_string(),
    }
}

/// Encode `key=value` pairs into a query string
pub fn encode_query(params: &[(&str, &str)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}
