//! Deterministic fallback embeddings.
//!
//! When the embedding service fails, the text is hashed with SHA-256 and the
//! digest bytes become the leading vector components (`byte / 255`), with the
//! rest of the vector zero-filled. The result is reproducible and has the
//! configured dimensionality, but it carries no semantic signal: any two
//! different texts land on nearly unrelated vectors. Retrieval keeps working
//! while the service is down, only with much weaker ranking.

use super::Embedder;
use crate::error::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::warn;

/// Which path produced an embedding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingSource {
    /// Returned by the embedding service.
    Primary,
    /// Derived from the text digest after the service failed.
    Fallback,
}

/// An embedding vector tagged with its source.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub source: EmbeddingSource,
}

impl Embedding {
    pub fn is_fallback(&self) -> bool {
        self.source == EmbeddingSource::Fallback
    }
}

/// Build the digest embedding for `text` with `dimensions` components.
pub fn digest_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let digest = Sha256::digest(text.as_bytes());

    let mut vector: Vec<f32> = digest
        .iter()
        .take(dimensions)
        .map(|&b| f32::from(b) / 255.0)
        .collect();
    vector.resize(dimensions, 0.0);
    vector
}

/// Embedder that never fails: primary errors fall back to [`digest_embedding`].
///
/// A primary vector whose length differs from the configured dimensionality
/// counts as a malformed response, so every vector this returns has the same
/// length regardless of path.
pub struct ResilientEmbedder {
    primary: Arc<dyn Embedder>,
    dimensions: usize,
}

impl ResilientEmbedder {
    pub fn new(primary: Arc<dyn Embedder>) -> Self {
        let dimensions = primary.dimensions();
        Self {
            primary,
            dimensions,
        }
    }

    /// Embed `text`, reporting which path produced the vector.
    pub async fn embed_tagged(&self, text: &str) -> Embedding {
        match self.primary.embed(text).await {
            Ok(vector) if vector.len() == self.dimensions => Embedding {
                vector,
                source: EmbeddingSource::Primary,
            },
            Ok(vector) => {
                warn!(
                    "Embedding service returned {} dimensions, expected {}; using digest fallback",
                    vector.len(),
                    self.dimensions
                );
                self.fallback(text)
            }
            Err(e) => {
                warn!("Embedding service failed, using digest fallback: {}", e);
                self.fallback(text)
            }
        }
    }

    fn fallback(&self, text: &str) -> Embedding {
        Embedding {
            vector: digest_embedding(text, self.dimensions),
            source: EmbeddingSource::Fallback,
        }
    }
}

#[async_trait]
impl Embedder for ResilientEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.embed_tagged(text).await.vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
