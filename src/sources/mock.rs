//! Mock source for testing purposes.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::models::{Article, SourceKind};
use crate::sources::{Source, SourceError};

/// A mock source for testing that returns a predefined response
///
/// It stands in for one [`SourceKind`] and counts how often it was called.
#[derive(Debug)]
pub struct MockSource {
    kind: SourceKind,
    response: Mutex<Result<Vec<Article>, String>>,
    calls: AtomicUsize,
}

impl MockSource {
    /// Create a mock that returns no articles
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            response: Mutex::new(Ok(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a mock that returns the given articles
    pub fn with_articles(kind: SourceKind, articles: Vec<Article>) -> Self {
        let source = Self::new(kind);
        source.set_articles(articles);
        source
    }

    /// Create a mock whose every fetch fails
    pub fn failing(kind: SourceKind, message: impl Into<String>) -> Self {
        let source = Self::new(kind);
        source.set_error(message);
        source
    }

    /// Create a mock returning one article per title, with a generated abstract
    pub fn with_titles(kind: SourceKind, titles: &[&str]) -> Self {
        let articles = titles
            .iter()
            .map(|title| Article::new(*title, format!("Abstract of {}", title), kind))
            .collect();
        Self::with_articles(kind, articles)
    }

    /// Set the articles to return
    pub fn set_articles(&self, articles: Vec<Article>) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = Ok(articles);
    }

    /// Make subsequent fetches fail with this message
    pub fn set_error(&self, message: impl Into<String>) {
        *self.response.lock().unwrap_or_else(PoisonError::into_inner) = Err(message.into());
    }

    /// How many times `fetch` was called
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    async fn fetch(&self, _query: &str, _max_results: usize) -> Result<Vec<Article>, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let guard = self.response.lock().unwrap_or_else(PoisonError::into_inner);
        match &*guard {
            Ok(articles) => Ok(articles.clone()),
            Err(message) => Err(SourceError::Network(message.clone())),
        }
    }
}

