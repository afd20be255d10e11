//! # literank
//!
//! Search PubMed, Europe PMC, arXiv and PubMed Central with one query and
//! rank the combined results by semantic similarity to it.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Core data structures (Article, ScoredArticle, SearchResult)
//! - [`sources`]: One client per literature API behind the [`Source`] trait
//! - [`embedding`]: Sentence embeddings and cosine similarity
//! - [`pipeline`]: Concurrent aggregation, ranking, and the [`Orchestrator`]
//! - [`utils`]: HTTP client, retry, and XML helpers
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal rendering helpers for the CLI
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use literank::config::Config;
//! use literank::embedding::LazyEmbedder;
//! use literank::Orchestrator;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let embedder = Arc::new(LazyEmbedder::bert(config.embedding.clone()));
//! let orchestrator = Orchestrator::from_config(&config, embedder)?;
//!
//! let result = orchestrator.search("obesity diabetes").await?;
//! for article in &result {
//!     println!("{:.2} {} ({})", article.similarity, article.title(), article.source());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod embedding;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use models::{Article, ScoredArticle, SearchResult, SourceKind};
pub use pipeline::{Orchestrator, SearchError};
pub use sources::{Source, SourceRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
