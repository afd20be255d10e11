//! Core data models for articles and ranked search results.

mod article;
mod search;

pub use article::{Article, SourceKind};
pub use search::{ScoredArticle, SearchResult, SourceReport, SourceStatus};
