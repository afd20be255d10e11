//! Utility modules supporting the source clients.
//!
//! - [`HttpClient`]: shared HTTP client with an NCBI request budget
//! - [`with_retry`]: execute an operation with automatic retry on transient errors
//! - [`RetryConfig`]: configuration for retry logic with exponential backoff
//! - [`extract_element_text`]: best-effort plain text of one XML element
//!
//! # Retry with Backoff
//!
//! ```rust,no_run
//! use literank::sources::SourceError;
//! use literank::utils::{with_retry, RetryConfig};
//!
//! # async fn fetch_data() -> Result<String, SourceError> { Ok("data".to_string()) }
//! # #[tokio::main]
//! # async fn main() -> Result<(), SourceError> {
//! let data = with_retry(RetryConfig::default(), || fetch_data()).await?;
//! # Ok(())
//! # }
//! ```

mod http;
mod retry;
mod xml;

pub use http::{encode_query, HttpClient};
pub use retry::{with_retry, RetryConfig, TransientError};
pub use xml::{collapse_whitespace, extract_element_text, Extraction};
