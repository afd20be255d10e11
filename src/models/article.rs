//! Article model shared by every literature source.

use serde::{Deserialize, Serialize};

/// The literature database an article was retrieved from
///
/// Declaration order is the merge order used when results from several
/// sources are concatenated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SourceKind {
    #[serde(rename = "pubmed")]
    PubMed,
    #[serde(rename = "europe_pmc")]
    EuropePmc,
    #[serde(rename = "arxiv")]
    Arxiv,
    #[serde(rename = "pmc")]
    PubMedCentral,
}

impl SourceKind {
    /// All sources in declared merge order
    pub const ALL: [SourceKind; 4] = [
        SourceKind::PubMed,
        SourceKind::EuropePmc,
        SourceKind::Arxiv,
        SourceKind::PubMedCentral,
    ];

    /// Returns the display name of the source
    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::PubMed => "PubMed",
            SourceKind::EuropePmc => "EuropePMC",
            SourceKind::Arxiv => "arXiv",
            SourceKind::PubMedCentral => "PubMed Central",
        }
    }

    /// Returns the source identifier used in config and on the command line
    pub fn id(&self) -> &'static str {
        match self {
            SourceKind::PubMed => "pubmed",
            SourceKind::EuropePmc => "europe_pmc",
            SourceKind::Arxiv => "arxiv",
            SourceKind::PubMedCentral => "pmc",
        }
    }

    /// Look up a source by its identifier (case-insensitive)
    pub fn from_id(id: &str) -> Option<Self> {
        let id = id.trim().to_lowercase();
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A title/abstract pair normalized from one source's response
///
/// `abstract` is always present; sources that cannot supply one store an
/// empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    /// Article title
    pub title: String,

    /// Abstract text, empty when unavailable
    pub r#abstract: String,

    /// Source the article came from
    pub source: SourceKind,
}

impl Article {
    /// Create a new article
    pub fn new(title: impl Into<String>, abstract_text: impl Into<String>, source: SourceKind) -> Self {
        Self {
            title: title.into(),
            r#abstract: abstract_text.into(),
            source,
        }
    }

    /// The text that gets embedded for ranking: `title + " " + abstract`
    pub fn content(&self) -> String {
        format!("{} {}", self.title, self.r#abstract)
    }

    /// Whether the source supplied an abstract
    pub fn has_abstract(&self) -> bool {
        !self.r#abstract.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_joins_title_and_abstract() {
        let article = Article::new("Insulin resistance", "A review.", SourceKind::PubMed);
        assert_eq!(article.content(), "Insulin resistance A review.");
    }

    #[test]
    fn test_content_with_empty_abstract_is_not_empty() {
        let article = Article::new("Insulin resistance", "", SourceKind::PubMed);
        assert!(!article.content().trim().is_empty());
        assert!(!article.has_abstract());
    }

    #[test]
    fn test_source_kind_order_matches_merge_order() {
        let mut kinds = vec![
            SourceKind::PubMedCentral,
            SourceKind::Arxiv,
            SourceKind::PubMed,
            SourceKind::EuropePmc,
        ];
        kinds.sort();
        assert_eq!(kinds, SourceKind::ALL.to_vec());
    }

    #[test]
    fn test_source_kind_ids() {
        assert_eq!(SourceKind::from_id("PMC"), Some(SourceKind::PubMedCentral));
        assert_eq!(SourceKind::from_id("europe_pmc"), Some(SourceKind::EuropePmc));
        assert_eq!(SourceKind::from_id("scholar"), None);
        assert_eq!(SourceKind::Arxiv.to_string(), "arXiv");
    }

    #[test]
    fn test_source_kind_serializes_as_id() {
        for kind in SourceKind::ALL {
            let json = serde_json::to_value(kind).unwrap();
            assert_eq!(json, kind.id());
            assert_eq!(serde_json::from_value::<SourceKind>(json).unwrap(), kind);
        }
    }
}
