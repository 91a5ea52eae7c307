//! Context building for RAG prompts.
//!
//! Chat prompts draw a few of the most relevant chunks from each source.
//! Flashcard and quiz prompts instead take the sources' raw text in order,
//! capped in length, since they aim for broad coverage rather than relevance.

use super::SimilaritySearch;
use crate::error::{LecternError, Result};
use crate::vector_store::{ChatTurn, ContentRegistry};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Builds prompt context from stored content.
#[derive(Clone)]
pub struct ContextAssembler {
    search: SimilaritySearch,
    registry: Arc<dyn ContentRegistry>,
    preamble: String,
    per_source_limit: usize,
    history_window: usize,
    broad_context_chars: usize,
}

impl ContextAssembler {
    /// Create a new context assembler.
    pub fn new(
        search: SimilaritySearch,
        registry: Arc<dyn ContentRegistry>,
        preamble: &str,
    ) -> Self {
        Self {
            search,
            registry,
            preamble: preamble.to_string(),
            per_source_limit: 2,
            history_window: 5,
            broad_context_chars: 4000,
        }
    }

    /// Set the number of chunks retrieved per source.
    pub fn with_per_source_limit(mut self, limit: usize) -> Self {
        self.per_source_limit = limit;
        self
    }

    /// Set how many recent turns are included.
    pub fn with_history_window(mut self, window: usize) -> Self {
        self.history_window = window;
        self
    }

    /// Set the character cap for broad context.
    pub fn with_broad_context_chars(mut self, chars: usize) -> Self {
        self.broad_context_chars = chars;
        self
    }

    /// Retrieve the most relevant chunks from every source, in source order,
    /// separated by blank lines.
    pub async fn retrieve_context(&self, content_ids: &[String], query: &str) -> Result<String> {
        let mut chunks = Vec::new();
        for content_id in content_ids {
            let found = self
                .search
                .search(content_id, query, self.per_source_limit)
                .await?;
            debug!("{} chunks from {}", found.len(), content_id);
            chunks.extend(found);
        }
        Ok(chunks.join("\n\n"))
    }

    /// Assemble the full chat prompt for `message`.
    #[instrument(skip(self, message, history), fields(sources = content_ids.len()))]
    pub async fn assemble(
        &self,
        content_ids: &[String],
        message: &str,
        history: &[ChatTurn],
    ) -> Result<String> {
        if message.trim().is_empty() {
            return Err(LecternError::InvalidInput("chat message is empty".to_string()));
        }

        let context = self.retrieve_context(content_ids, message).await?;
        Ok(format_chat_prompt(
            &self.preamble,
            &context,
            recent_turns(history, self.history_window),
            message,
        ))
    }

    /// Concatenate the sources' raw text and cap it to the configured length.
    #[instrument(skip(self), fields(sources = content_ids.len()))]
    pub async fn assemble_broad_context(&self, content_ids: &[String]) -> Result<String> {
        let mut combined = String::new();
        for content_id in content_ids {
            combined.push_str(&self.registry.get_raw_text(content_id).await?);
            combined.push_str("\n\n");
        }
        Ok(truncate_chars(&combined, self.broad_context_chars).to_string())
    }
}

/// The last `window` turns, oldest first.
pub fn recent_turns(history: &[ChatTurn], window: usize) -> &[ChatTurn] {
    &history[history.len().saturating_sub(window)..]
}

/// Lay out a chat prompt: preamble, retrieved content, prior turns as
/// `role: message` lines, the new user message and an open assistant turn.
pub fn format_chat_prompt(
    preamble: &str,
    context: &str,
    history: &[ChatTurn],
    message: &str,
) -> String {
    let mut prompt = format!("{}\n\nContent:\n{}\n\n", preamble, context);
    for turn in history {
        prompt.push_str(&format!("{}: {}\n", turn.role, turn.message));
    }
    prompt.push_str(&format!("user: {}\nassistant: ", message));
    prompt
}

/// The first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::{Embedder, ResilientEmbedder};
    use crate::testing::KeywordEmbedder;
    use crate::vector_store::{Content, ContentType, MemoryStore, VectorStore};

    const VOCABULARY: &[&str] = &["cell", "energy", "war", "treaty"];

    async fn assembler() -> (ContextAssembler, Arc<MemoryStore>) {
        let embedder = Arc::new(KeywordEmbedder::new(VOCABULARY));
        let store = Arc::new(MemoryStore::new());

        let sources = [
            ("bio", "The cell makes energy. Energy powers the cell."),
            ("history", "The war ended with a treaty."),
        ];
        for (id, text) in sources {
            store
                .register(Content::new(id.to_string(), ContentType::Pdf, text.to_string()))
                .await
                .unwrap();
        }

        for (id, chunk) in [
            ("bio", "cell energy"),
            ("bio", "cell walls"),
            ("bio", "energy energy"),
            ("history", "war"),
            ("history", "treaty of peace"),
        ] {
            let embedding = embedder.embed(chunk).await.unwrap();
            store.put(id, chunk, embedding).await.unwrap();
        }

        let embedder = Arc::new(ResilientEmbedder::new(embedder));
        let search = SimilaritySearch::new(store.clone(), embedder);
        let assembler = ContextAssembler::new(search, store.clone(), "You are a tutor.");
        (assembler, store)
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_retrieve_context_in_source_order() {
        let (assembler, _) = assembler().await;
        let context = assembler
            .retrieve_context(&ids(&["history", "bio"]), "energy in the cell")
            .await
            .unwrap();

        let parts: Vec<&str> = context.split("\n\n").collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(&parts[..2], &["war", "treaty of peace"]);
        assert_eq!(parts[2], "cell energy");
    }

    #[tokio::test]
    async fn test_duplicate_sources_are_repeated() {
        let (assembler, _) = assembler().await;
        let context = assembler
            .retrieve_context(&ids(&["history", "history"]), "treaty")
            .await
            .unwrap();
        assert_eq!(context, "treaty of peace\n\nwar\n\ntreaty of peace\n\nwar");
    }

    #[tokio::test]
    async fn test_assemble_prompt_layout() {
        let (assembler, _) = assembler().await;
        let prompt = assembler
            .with_per_source_limit(1)
            .assemble(&ids(&["history"]), "Who signed the treaty?", &[])
            .await
            .unwrap();

        assert_eq!(
            prompt,
            "You are a tutor.\n\nContent:\ntreaty of peace\n\nuser: Who signed the treaty?\nassistant: "
        );
    }

    #[tokio::test]
    async fn test_assemble_keeps_last_five_turns() {
        let (assembler, _) = assembler().await;
        let history: Vec<ChatTurn> = (1..=7)
            .map(|i| {
                if i % 2 == 1 {
                    ChatTurn::user(format!("question {}", i))
                } else {
                    ChatTurn::assistant(format!("answer {}", i))
                }
            })
            .collect();

        let prompt = assembler
            .assemble(&ids(&["bio"]), "And then?", &history)
            .await
            .unwrap();

        let conversation = prompt.split("\n\n").last().unwrap();
        assert_eq!(
            conversation,
            "user: question 3\nassistant: answer 4\nuser: question 5\nassistant: answer 6\nuser: question 7\nuser: And then?\nassistant: "
        );
        assert!(!prompt.contains("answer 2"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (assembler, _) = assembler().await;
        let err = assembler.assemble(&ids(&["bio"]), "   ", &[]).await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_broad_context_concatenates_raw_text() {
        let (assembler, _) = assembler().await;
        let context = assembler
            .assemble_broad_context(&ids(&["bio", "missing", "history"]))
            .await
            .unwrap();
        assert_eq!(
            context,
            "The cell makes energy. Energy powers the cell.\n\n\n\nThe war ended with a treaty.\n\n"
        );
    }

    #[tokio::test]
    async fn test_broad_context_is_truncated() {
        let (assembler, store) = assembler().await;
        store
            .register(Content::new("long".to_string(), ContentType::Youtube, "é".repeat(5000)))
            .await
            .unwrap();

        let context = assembler.assemble_broad_context(&ids(&["long"])).await.unwrap();
        assert_eq!(context.chars().count(), 4000);

        let context = assembler
            .with_broad_context_chars(10)
            .assemble_broad_context(&ids(&["history"]))
            .await
            .unwrap();
        assert_eq!(context, "The war en");
    }

    #[test]
    fn test_recent_turns() {
        let history = vec![ChatTurn::user("a"), ChatTurn::assistant("b")];
        assert_eq!(recent_turns(&history, 5), &history[..]);
        assert_eq!(recent_turns(&history, 1), &history[1..]);
        assert!(recent_turns(&history, 0).is_empty());
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("", 3), "");
    }
}
