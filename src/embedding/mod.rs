//! Sentence embeddings for semantic ranking.
//!
//! [`Embedder`] maps text to fixed-length vectors; ranking compares them with
//! [`cosine_similarity`]. The production backend is [`BertEmbedder`], a
//! Candle BERT model pulled from the Hugging Face Hub, usually wrapped in a
//! [`LazyEmbedder`] so the weights load once, on first use.

mod bert;
mod lazy;
pub mod mock;

pub use bert::BertEmbedder;
pub use lazy::LazyEmbedder;
pub use mock::MockEmbedder;

use async_trait::async_trait;

/// A text embedding backend
#[async_trait]
pub trait Embedder: Send + Sync + std::fmt::Debug {
    /// Model identifier, for logs and output
    fn model_name(&self) -> &str;

    /// Embed a batch of texts, one vector per input in input order
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;

    /// Embed a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        self.embed_batch(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EmbedError::Inference("backend returned no embedding".to_string()))
    }
}

/// Errors from the embedding backend
#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model download failed: {0}")]
    Download(String),

    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<candle_core::Error> for EmbedError {
    fn from(e: candle_core::Error) -> Self {
        EmbedError::Inference(e.to_string())
    }
}

impl From<tokenizers::Error> for EmbedError {
    fn from(e: tokenizers::Error) -> Self {
        EmbedError::Tokenizer(e.to_string())
    }
}

impl From<hf_hub::api::sync::ApiError> for EmbedError {
    fn from(e: hf_hub::api::sync::ApiError) -> Self {
        EmbedError::Download(e.to_string())
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns a value in `[-1.0, 1.0]`, or `0.0` when either vector has zero
/// magnitude. Both vectors should be the same length.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have equal length");
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    let denom = norm_a * norm_b;
    if denom < 1e-12 {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0)
}
