//! Exhaustive similarity search over one content's chunks.

use crate::embedding::ResilientEmbedder;
use crate::error::Result;
use crate::vector_store::{cosine_similarity, EmbeddingRecord, VectorStore};
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, instrument};

/// A ranked chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub chunk_text: String,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f32,
    /// Insertion index of the chunk within its content.
    pub position: usize,
}

/// Ranks a content's stored chunks against a query.
#[derive(Clone)]
pub struct SimilaritySearch {
    vector_store: Arc<dyn VectorStore>,
    embedder: Arc<ResilientEmbedder>,
}

impl SimilaritySearch {
    pub fn new(vector_store: Arc<dyn VectorStore>, embedder: Arc<ResilientEmbedder>) -> Self {
        Self {
            vector_store,
            embedder,
        }
    }

    /// Texts of the `limit` chunks most similar to `query`, best first.
    pub async fn search(&self, content_id: &str, query: &str, limit: usize) -> Result<Vec<String>> {
        Ok(self
            .search_scored(content_id, query, limit)
            .await?
            .into_iter()
            .map(|r| r.chunk_text)
            .collect())
    }

    /// Like [`search`](Self::search), keeping scores and positions.
    #[instrument(skip(self, content_id, query), fields(content_id = %content_id))]
    pub async fn search_scored(
        &self,
        content_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let records = self.vector_store.get_all(content_id).await?;
        if records.is_empty() || limit == 0 {
            debug!("Nothing to rank for {}", content_id);
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed_tagged(query).await;
        if query_embedding.is_fallback() {
            debug!("Ranking with a fallback query embedding");
        }

        let results = rank(&query_embedding.vector, records, limit);
        debug!("Ranked {} results for {}", results.len(), content_id);
        Ok(results)
    }
}

/// Score every record against `query_embedding` and keep the top `limit`.
///
/// The sort is stable, so equal scores keep insertion order.
pub fn rank(
    query_embedding: &[f32],
    records: Vec<EmbeddingRecord>,
    limit: usize,
) -> Vec<SearchResult> {
    let mut results: Vec<SearchResult> = records
        .into_iter()
        .enumerate()
        .map(|(position, record)| SearchResult {
            score: cosine_similarity(query_embedding, &record.embedding),
            chunk_text: record.chunk_text,
            position,
        })
        .collect();

    results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    results.truncate(limit);
    results
}
