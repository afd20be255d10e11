//! Semantic ranking of articles against the query.

use std::sync::Arc;

use crate::embedding::{cosine_similarity, EmbedError, Embedder};
use crate::models::{Article, ScoredArticle};

/// Scores articles by cosine similarity between the query embedding and the
/// embedding of each article's `title + " " + abstract`
#[derive(Debug, Clone)]
pub struct Ranker {
    embedder: Arc<dyn Embedder>,
}

impl Ranker {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    /// Rank articles by similarity to `query`, highest first
    ///
    /// The sort is stable, so equal scores keep their merged order. Empty
    /// input returns immediately without touching the embedder.
    pub async fn rank(
        &self,
        articles: Vec<Article>,
        query: &str,
    ) -> Result<Vec<ScoredArticle>, EmbedError> {
        if articles.is_empty() {
            return Ok(Vec::new());
        }

        let contents: Vec<String> = articles.iter().map(Article::content).collect();

        let query_embedding = self.embedder.embed(query).await?;
        let embeddings = self.embedder.embed_batch(&contents).await?;

        if embeddings.len() != articles.len() {
            return Err(EmbedError::Inference(format!(
                "expected {} embeddings, got {}",
                articles.len(),
                embeddings.len()
            )));
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != query_embedding.len()) {
            return Err(EmbedError::Inference(format!(
                "embedding dimension mismatch: query {}, article {}",
                query_embedding.len(),
                bad.len()
            )));
        }

        let mut scored: Vec<ScoredArticle> = articles
            .into_iter()
            .zip(&embeddings)
            .map(|(article, embedding)| {
                ScoredArticle::new(article, score(&query_embedding, embedding))
            })
            .collect();

        scored.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        tracing::debug!(
            count = scored.len(),
            model = self.embedder.model_name(),
            "ranked articles"
        );
        Ok(scored)
    }
}

/// Cosine similarity with a total order: NaN sorts last, -0.0 equals 0.0
fn score(query: &[f32], article: &[f32]) -> f32 {
    let similarity = cosine_similarity(query, article);
    if similarity.is_nan() {
        -1.0
    } else if similarity == 0.0 {
        0.0
    } else {
        similarity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbedder;
    use crate::models::SourceKind;

    /// A unit vector whose cosine with `[1, 0]` is `s`
    fn at(s: f32) -> Vec<f32> {
        vec![s, (1.0 - s * s).sqrt()]
    }

    fn article(title: &str) -> Article {
        Article::new(title, "", SourceKind::PubMed)
    }

    #[tokio::test]
    async fn test_orders_by_descending_similarity() {
        let embedder = MockEmbedder::new(2)
            .with_vector("q", vec![1.0, 0.0])
            .with_vector("low ", at(0.2))
            .with_vector("high ", at(0.9))
            .with_vector("mid ", at(0.5));
        let ranker = Ranker::new(Arc::new(embedder));

        let ranked = ranker
            .rank(vec![article("low"), article("high"), article("mid")], "q")
            .await
            .unwrap();

        let titles: Vec<_> = ranked.iter().map(|a| a.title()).collect();
        assert_eq!(titles, vec!["high", "mid", "low"]);
        assert!((ranked[0].similarity - 0.9).abs() < 1e-5);
    }

    #[tokio::test]
    async fn test_ties_keep_merged_order() {
        let embedder = MockEmbedder::new(2)
            .with_vector("q", vec![1.0, 0.0])
            .with_vector("first ", at(0.5))
            .with_vector("second ", at(0.5))
            .with_vector("third ", at(0.7));
        let ranker = Ranker::new(Arc::new(embedder));

        let ranked = ranker
            .rank(
                vec![article("first"), article("second"), article("third")],
                "q",
            )
            .await
            .unwrap();

        let titles: Vec<_> = ranked.iter().map(|a| a.title()).collect();
        assert_eq!(titles, vec!["third", "first", "second"]);
    }

    #[tokio::test]
    async fn test_empty_input_skips_embedder() {
        let embedder = Arc::new(MockEmbedder::failing("should not be called"));
        let ranker = Ranker::new(embedder.clone());

        let ranked = ranker.rank(Vec::new(), "q").await.unwrap();

        assert!(ranked.is_empty());
        assert_eq!(embedder.call_count(), 0);
    }

    #[tokio::test]
    async fn test_embedder_failure_is_returned() {
        let ranker = Ranker::new(Arc::new(MockEmbedder::failing("no weights")));
        let result = ranker.rank(vec![article("a")], "q").await;
        assert!(matches!(result, Err(EmbedError::ModelLoad(_))));
    }

    #[tokio::test]
    async fn test_identical_text_scores_highest() {
        let ranker = Ranker::new(Arc::new(MockEmbedder::new(64)));
        let query = "obesity diabetes";
        let exact = Article::new("obesity", "diabetes", SourceKind::Arxiv);

        let ranked = ranker
            .rank(
                vec![
                    Article::new("galaxy rotation curves", "dark matter", SourceKind::Arxiv),
                    exact.clone(),
                ],
                query,
            )
            .await
            .unwrap();

        assert_eq!(ranked[0].article, exact);
        assert!((ranked[0].similarity - 1.0).abs() < 1e-5);
        assert!(ranked.iter().all(|a| (-1.0..=1.0).contains(&a.similarity)));
    }

    #[test]
    fn test_score_normalizes_special_values() {
        assert_eq!(score(&[0.0], &[0.0]), 0.0);
        assert!(score(&[-1.0], &[1.0]) < 0.0);
    }
}
