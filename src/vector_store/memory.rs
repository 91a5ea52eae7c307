//! In-memory store implementation.
//!
//! Holds embeddings, content and chat history in one map set behind a single
//! `RwLock`, so `clear_all` is never observed half done. Nothing is persisted.

use super::{ChatHistory, ChatTurn, Content, ContentRegistry, EmbeddingRecord, VectorStore};
use crate::error::{LecternError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct StoreState {
    embeddings: HashMap<String, Vec<EmbeddingRecord>>,
    contents: HashMap<String, Content>,
    history: HashMap<String, Vec<ChatTurn>>,
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
}

impl MemoryStore {
    /// Create a new, empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>> {
        self.state
            .read()
            .map_err(|_| LecternError::VectorStore("store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>> {
        self.state
            .write()
            .map_err(|_| LecternError::VectorStore("store lock poisoned".to_string()))
    }

    /// Number of records stored for a content ID.
    pub fn record_count(&self, content_id: &str) -> Result<usize> {
        Ok(self
            .read()?
            .embeddings
            .get(content_id)
            .map_or(0, Vec::len))
    }
}

#[async_trait]
impl VectorStore for MemoryStore {
    async fn put(&self, content_id: &str, chunk_text: &str, embedding: Vec<f32>) -> Result<()> {
        let mut state = self.write()?;
        state
            .embeddings
            .entry(content_id.to_string())
            .or_default()
            .push(EmbeddingRecord {
                chunk_text: chunk_text.to_string(),
                embedding,
            });
        Ok(())
    }

    async fn get_all(&self, content_id: &str) -> Result<Vec<EmbeddingRecord>> {
        let state = self.read()?;
        Ok(state.embeddings.get(content_id).cloned().unwrap_or_default())
    }

    async fn clear_all(&self) -> Result<()> {
        let mut state = self.write()?;
        *state = StoreState::default();
        Ok(())
    }
}

#[async_trait]
impl ContentRegistry for MemoryStore {
    async fn register(&self, content: Content) -> Result<()> {
        let mut state = self.write()?;
        if state.contents.contains_key(&content.id) {
            return Err(LecternError::InvalidInput(format!(
                "Content already registered: {}",
                content.id
            )));
        }
        state.contents.insert(content.id.clone(), content);
        Ok(())
    }

    async fn get_content(&self, content_id: &str) -> Result<Option<Content>> {
        let state = self.read()?;
        Ok(state.contents.get(content_id).cloned())
    }
}

#[async_trait]
impl ChatHistory for MemoryStore {
    async fn append_turn(&self, content_id: &str, turn: ChatTurn) -> Result<()> {
        let mut state = self.write()?;
        state
            .history
            .entry(content_id.to_string())
            .or_default()
            .push(turn);
        Ok(())
    }

    async fn history(&self, content_id: &str) -> Result<Vec<ChatTurn>> {
        let state = self.read()?;
        Ok(state.history.get(content_id).cloned().unwrap_or_default())
    }
}
