//! The search pipeline: aggregate from sources, then rank.
//!
//! - [`Aggregator`]: concurrent fan-out to every source, failures isolated
//! - [`Ranker`]: embeds query and articles, sorts by cosine similarity
//! - [`Orchestrator`]: the single entry point tying the two together

mod aggregator;
mod orchestrator;
mod ranker;

pub use aggregator::{Aggregation, Aggregator};
pub use orchestrator::Orchestrator;
pub use ranker::Ranker;

use crate::embedding::EmbedError;
use crate::sources::SourceError;

/// Errors that fail a whole search
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The embedding model could not be loaded or run
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    /// The sources could not be set up
    #[error("Source setup failed: {0}")]
    Source(#[from] SourceError),
}
