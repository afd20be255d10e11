//! Load-on-first-use wrapper around an embedding backend.

use std::future::Future;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use tokio::sync::OnceCell;

use super::{BertEmbedder, EmbedError, Embedder};
use crate::config::EmbeddingConfig;

type Loader<E> = Box<dyn Fn() -> BoxFuture<'static, Result<E, EmbedError>> + Send + Sync>;

/// An embedder that is constructed on the first embed call
///
/// Concurrent first calls wait on a single load. A failed load is not
/// cached, so the next call tries again.
pub struct LazyEmbedder<E> {
    model_name: String,
    loader: Loader<E>,
    cell: OnceCell<E>,
}

impl<E: Embedder> LazyEmbedder<E> {
    /// Create a lazy embedder from a loader
    pub fn new<F, Fut>(model_name: impl Into<String>, loader: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<E, EmbedError>> + Send + 'static,
    {
        Self {
            model_name: model_name.into(),
            loader: Box::new(move || Box::pin(loader())),
            cell: OnceCell::new(),
        }
    }

    /// Whether the backend has been loaded
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Get the backend, loading it if needed
    pub async fn get(&self) -> Result<&E, EmbedError> {
        self.cell.get_or_try_init(|| (self.loader)()).await
    }
}

impl LazyEmbedder<BertEmbedder> {
    /// A lazily loaded BERT embedder for the configured model
    pub fn bert(config: EmbeddingConfig) -> Self {
        let model_name = config.model_id.clone();
        Self::new(model_name, move || {
            let config = config.clone();
            async move { BertEmbedder::load(&config).await }
        })
    }
}

impl<E> std::fmt::Debug for LazyEmbedder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyEmbedder")
            .field("model_name", &self.model_name)
            .field("loaded", &self.cell.initialized())
            .finish()
    }
}

#[async_trait]
impl<E: Embedder> Embedder for LazyEmbedder<E> {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        self.get().await?.embed_batch(texts).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let lazy = LazyEmbedder::new("mock", move || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Ok(MockEmbedder::new(8)) }
        });

        assert!(!lazy.is_loaded());
        lazy.embed("first").await.unwrap();
        lazy.embed_batch(&["second".to_string()]).await.unwrap();

        assert!(lazy.is_loaded());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(lazy.model_name(), "mock");
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let loads = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loads);
        let lazy = LazyEmbedder::new("flaky", move || {
            let attempt = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(EmbedError::Download("offline".to_string()))
                } else {
                    Ok(MockEmbedder::new(8))
                }
            }
        });

        assert!(matches!(lazy.embed("x").await, Err(EmbedError::Download(_))));
        assert!(!lazy.is_loaded());
        assert!(lazy.embed("x").await.is_ok());
        assert_eq!(loads.load(Ordering::SeqCst), 2);
    }
}
