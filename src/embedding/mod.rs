//! Embedding generation for semantic search and retrieval.
//!
//! [`OpenAIEmbedder`] talks to the embedding service. [`ResilientEmbedder`]
//! wraps any embedder and substitutes a deterministic digest vector whenever
//! the primary call fails, reporting which path produced each vector.

mod fallback;
mod openai;

pub use fallback::{digest_embedding, Embedding, EmbeddingSource, ResilientEmbedder};
pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Get the embedding dimensions.
    fn dimensions(&self) -> usize;
}
