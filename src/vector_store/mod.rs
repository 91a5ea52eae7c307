//! Storage abstractions for Lectern.
//!
//! Three capabilities are kept apart so each component depends only on what
//! it reads: [`VectorStore`] for chunk embeddings, [`ContentRegistry`] for the
//! raw text of ingested content, and [`ChatHistory`] for conversation turns.
//! [`MemoryStore`] implements all three behind a single lock.

mod memory;

pub use memory::MemoryStore;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of source a piece of content was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Pdf,
    Youtube,
}

impl std::str::FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pdf" => Ok(ContentType::Pdf),
            "youtube" | "video" => Ok(ContentType::Youtube),
            _ => Err(format!("Unknown content type: {}", s)),
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Pdf => write!(f, "pdf"),
            ContentType::Youtube => write!(f, "youtube"),
        }
    }
}

/// An ingested source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub id: String,
    pub content_type: ContentType,
    /// Full extracted text.
    pub raw_text: String,
    pub created_at: DateTime<Utc>,
}

impl Content {
    pub fn new(id: String, content_type: ContentType, raw_text: String) -> Self {
        Self {
            id,
            content_type,
            raw_text,
            created_at: Utc::now(),
        }
    }
}

/// A stored chunk and its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub chunk_text: String,
    pub embedding: Vec<f32>,
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(alias = "content")]
    pub message: String,
}

impl ChatTurn {
    pub fn user(message: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            message: message.into(),
        }
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            message: message.into(),
        }
    }
}

/// Append-only storage of chunk embeddings, grouped by content ID.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Append a record to the content's list, creating the list if needed.
    async fn put(&self, content_id: &str, chunk_text: &str, embedding: Vec<f32>) -> Result<()>;

    /// All records for a content ID in insertion order. Unknown IDs yield an
    /// empty list.
    async fn get_all(&self, content_id: &str) -> Result<Vec<EmbeddingRecord>>;

    /// Remove every record, registered content and chat turn in one step.
    async fn clear_all(&self) -> Result<()>;
}

/// Read/write access to ingested content.
#[async_trait]
pub trait ContentRegistry: Send + Sync {
    /// Register content. Content is immutable once registered.
    async fn register(&self, content: Content) -> Result<()>;

    /// Look up content by ID.
    async fn get_content(&self, content_id: &str) -> Result<Option<Content>>;

    /// Raw text for a content ID, or an empty string if it is unknown.
    async fn get_raw_text(&self, content_id: &str) -> Result<String> {
        Ok(self
            .get_content(content_id)
            .await?
            .map(|c| c.raw_text)
            .unwrap_or_default())
    }
}

/// Append-only conversation history per content ID.
#[async_trait]
pub trait ChatHistory: Send + Sync {
    async fn append_turn(&self, content_id: &str, turn: ChatTurn) -> Result<()>;

    async fn history(&self, content_id: &str) -> Result<Vec<ChatTurn>>;
}

/// Compute cosine similarity between two vectors.
///
/// Zero-magnitude, empty or mismatched vectors have no defined angle and
/// score -1.0, the lowest possible similarity. Non-finite input scores the same,
/// so the result is never NaN.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return -1.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return -1.0;
    }

    let similarity = dot_product / (norm_a * norm_b);
    if similarity.is_nan() {
        return -1.0;
    }
    similarity
}
