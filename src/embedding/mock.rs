//! Deterministic embedder for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{EmbedError, Embedder};

/// A mock embedder with fixed vectors
///
/// Texts registered with [`MockEmbedder::with_vector`] map to that vector.
/// Any other text is embedded as a bag of hashed lowercase words, so equal
/// texts get equal vectors and texts sharing words point the same way.
#[derive(Debug)]
pub struct MockEmbedder {
    dimension: usize,
    vectors: HashMap<String, Vec<f32>>,
    error: Option<String>,
    calls: AtomicUsize,
    texts_embedded: AtomicUsize,
}

impl MockEmbedder {
    /// Create a mock producing vectors of the given dimension
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            vectors: HashMap::new(),
            error: None,
            calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        }
    }

    /// Return `vector` whenever exactly `text` is embedded
    pub fn with_vector(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Create a mock whose every call fails
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::new(1)
        }
    }

    /// Number of `embed`/`embed_batch` calls
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Total number of texts embedded across calls
    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.vectors.get(text) {
            return vector.clone();
        }

        let mut vector = vec![0.0; self.dimension];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            // FNV-1a
            let hash = word
                .bytes()
                .fold(0xcbf29ce484222325u64, |h, b| (h ^ b as u64).wrapping_mul(0x100000001b3));
            vector[(hash % self.dimension as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn model_name(&self) -> &str {
        "mock"
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.error {
            return Err(EmbedError::ModelLoad(message.clone()));
        }
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|text| self.vector_for(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_registered_vector_wins() {
        let embedder = MockEmbedder::new(3).with_vector("query", vec![1.0, 0.0, 0.0]);
        assert_eq!(embedder.embed("query").await.unwrap(), vec![1.0, 0.0, 0.0]);
    }

    #[tokio::test]
    async fn test_hashed_vectors_are_deterministic() {
        let embedder = MockEmbedder::new(16);
        let a = embedder.embed("Insulin resistance").await.unwrap();
        let b = embedder.embed("insulin  RESISTANCE").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_eq!(embedder.call_count(), 2);
    }

    #[tokio::test]
    async fn test_failing() {
        let embedder = MockEmbedder::failing("no model");
        assert!(embedder.embed("x").await.is_err());
        assert_eq!(embedder.texts_embedded(), 0);
    }
}
