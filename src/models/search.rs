//! Ranked search output.

use serde::{Deserialize, Serialize};

use super::{Article, SourceKind};

/// An article paired with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    /// The article that was scored
    #[serde(flatten)]
    pub article: Article,

    /// Cosine similarity to the query, in `[-1, 1]`
    pub similarity: f32,
}

impl ScoredArticle {
    pub fn new(article: Article, similarity: f32) -> Self {
        Self {
            article,
            similarity,
        }
    }

    pub fn title(&self) -> &str {
        &self.article.title
    }

    pub fn abstract_text(&self) -> &str {
        &self.article.r#abstract
    }

    pub fn source(&self) -> SourceKind {
        self.article.source
    }
}

/// How one source fared during a search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    /// The source answered; `count` articles were kept
    Ok { count: usize },
    /// The top-level call failed and the source contributed nothing
    Failed { error: String },
}

/// Per-source outcome attached to a search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReport {
    pub source: SourceKind,
    #[serde(flatten)]
    pub status: SourceStatus,
}

impl SourceReport {
    pub fn ok(source: SourceKind, count: usize) -> Self {
        Self {
            source,
            status: SourceStatus::Ok { count },
        }
    }

    pub fn failed(source: SourceKind, error: impl Into<String>) -> Self {
        Self {
            source,
            status: SourceStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, SourceStatus::Failed { .. })
    }
}

/// Articles sorted by similarity (descending), plus per-source reports
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResult {
    /// The query as entered
    pub query: String,

    /// Scored articles, most similar first
    pub articles: Vec<ScoredArticle>,

    /// One report per source that was queried, in merge order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<SourceReport>,
}

impl SearchResult {
    /// An empty result ("no results", not an error)
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            articles: Vec::new(),
            reports: Vec::new(),
        }
    }

    pub fn new(query: impl Into<String>, articles: Vec<ScoredArticle>) -> Self {
        Self {
            query: query.into(),
            articles,
            reports: Vec::new(),
        }
    }

    /// Attach per-source reports
    pub fn with_reports(mut self, reports: Vec<SourceReport>) -> Self {
        self.reports = reports;
        self
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredArticle> {
        self.articles.iter()
    }

    /// Reports for sources whose top-level call failed
    pub fn failed_sources(&self) -> impl Iterator<Item = &SourceReport> {
        self.reports.iter().filter(|r| r.is_failed())
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a ScoredArticle;
    type IntoIter = std::slice::Iter<'a, ScoredArticle>;

    fn into_iter(self) -> Self::IntoIter {
        self.articles.iter()
    }
}
