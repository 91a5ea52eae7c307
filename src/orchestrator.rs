//! Pipeline orchestrator for Lectern.
//!
//! Wires chunking, embedding, storage and generation together and exposes
//! the operations the CLI and HTTP server call: ingest, search, streamed
//! chat and broad-context study material.

use crate::chunking::{chunks, ChunkingConfig};
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder, ResilientEmbedder};
use crate::error::{LecternError, Result};
use crate::rag::{
    stream::framed, ContextAssembler, Flashcard, Generator, OpenAIGenerator, QuizQuestion,
    RagEngine, SimilaritySearch, TextStream,
};
use crate::vector_store::{
    ChatHistory, ChatTurn, Content, ContentRegistry, ContentType, MemoryStore, VectorStore,
};
use futures::{StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// The main orchestrator for the Lectern pipeline.
pub struct Orchestrator {
    settings: Settings,
    store: Arc<MemoryStore>,
    embedder: Arc<ResilientEmbedder>,
    search: SimilaritySearch,
    engine: RagEngine,
}

impl Orchestrator {
    /// Create a new orchestrator talking to the configured provider.
    pub fn new(settings: Settings) -> Result<Self> {
        let prompts = Prompts::load(settings.prompts.custom_dir.as_deref())?;

        let embedder: Arc<dyn Embedder> =
            Arc::new(OpenAIEmbedder::new(&settings.provider, &settings.embedding)?);
        let generator: Arc<dyn Generator> =
            Arc::new(OpenAIGenerator::new(&settings.provider, &settings.generation)?);

        info!(
            "Using {} for embeddings and {} for generation",
            settings.embedding.model, settings.generation.model
        );

        Ok(Self::with_components(
            settings,
            prompts,
            embedder,
            generator,
            Arc::new(MemoryStore::new()),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: Prompts,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        store: Arc<MemoryStore>,
    ) -> Self {
        let embedder = Arc::new(ResilientEmbedder::new(embedder));
        let search = SimilaritySearch::new(store.clone(), embedder.clone());

        let assembler = ContextAssembler::new(search.clone(), store.clone(), &prompts.chat.preamble)
            .with_per_source_limit(settings.rag.per_source_limit)
            .with_history_window(settings.rag.history_window)
            .with_broad_context_chars(settings.rag.broad_context_chars);
        let engine = RagEngine::new(assembler, generator).with_prompts(prompts.study);

        Self {
            settings,
            store,
            embedder,
            search,
            engine,
        }
    }

    /// Get a reference to the store.
    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Register new content under a fresh ID, then chunk, embed and store it.
    pub async fn ingest_content(
        &self,
        content_type: ContentType,
        raw_text: &str,
    ) -> Result<IngestResult> {
        ChunkingConfig::from(&self.settings.chunking).step()?;

        let content_id = Uuid::new_v4().to_string();
        self.store
            .register(Content::new(content_id.clone(), content_type, raw_text.to_string()))
            .await?;
        self.ingest(&content_id, raw_text).await
    }

    /// Chunk `raw_text`, embed each chunk in order and append it to the
    /// content's records.
    ///
    /// Chunks are embedded one at a time. If storing fails part way, chunks
    /// stored before the failure are kept.
    #[instrument(
        skip(self, content_id, raw_text),
        fields(content_id = %content_id, len = raw_text.len())
    )]
    pub async fn ingest(&self, content_id: &str, raw_text: &str) -> Result<IngestResult> {
        if content_id.trim().is_empty() {
            return Err(LecternError::InvalidInput("content id is empty".to_string()));
        }

        let config = ChunkingConfig::from(&self.settings.chunking);
        let pieces = chunks(raw_text, config)?;
        info!("Ingesting {} chunks", pieces.len());

        let mut result = IngestResult {
            content_id: content_id.to_string(),
            chunks_indexed: 0,
            fallback_chunks: 0,
        };

        for chunk in pieces {
            let embedding = self.embedder.embed_tagged(chunk).await;
            if embedding.is_fallback() {
                result.fallback_chunks += 1;
            }
            self.store.put(content_id, chunk, embedding.vector).await?;
            result.chunks_indexed += 1;
        }

        if result.fallback_chunks > 0 {
            warn!(
                "{} of {} chunks for {} use fallback embeddings; retrieval quality is degraded",
                result.fallback_chunks, result.chunks_indexed, content_id
            );
        }

        Ok(result)
    }

    /// Texts of the stored chunks most similar to `query`, best first.
    pub async fn search(&self, content_id: &str, query: &str, limit: usize) -> Result<Vec<String>> {
        self.search.search(content_id, query, limit).await
    }

    /// Stream a framed answer to `message`, ending with the end-of-stream
    /// marker.
    pub async fn chat_stream(
        &self,
        content_ids: &[String],
        message: &str,
        history: &[ChatTurn],
    ) -> Result<TextStream> {
        let segments = self.chat_segments(content_ids, message, history).await?;
        Ok(framed(segments))
    }

    /// Stream the raw answer segments without framing.
    pub async fn chat_segments(
        &self,
        content_ids: &[String],
        message: &str,
        history: &[ChatTurn],
    ) -> Result<TextStream> {
        let segments = self.engine.chat(content_ids, message, history).await?;
        Ok(with_chat_context(segments, content_ids))
    }

    /// Combined raw text of the sources, capped in length.
    pub async fn assemble_broad_context(&self, content_ids: &[String]) -> Result<String> {
        self.engine.assembler().assemble_broad_context(content_ids).await
    }

    pub async fn generate_flashcards(&self, content_ids: &[String]) -> Result<Vec<Flashcard>> {
        self.engine.generate_flashcards(content_ids).await
    }

    pub async fn generate_quiz(&self, content_ids: &[String]) -> Result<Vec<QuizQuestion>> {
        self.engine.generate_quiz(content_ids).await
    }

    /// Append a turn to a content's chat history.
    pub async fn record_turn(&self, content_id: &str, turn: ChatTurn) -> Result<()> {
        self.store.append_turn(content_id, turn).await
    }

    pub async fn history(&self, content_id: &str) -> Result<Vec<ChatTurn>> {
        self.store.history(content_id).await
    }

    /// Drop all content, embeddings and chat history.
    pub async fn clear_all(&self) -> Result<()> {
        info!("Clearing all stored content");
        self.store.clear_all().await
    }
}

/// Log a mid-stream generation failure and name the sources in its error.
fn with_chat_context(segments: TextStream, content_ids: &[String]) -> TextStream {
    let sources = content_ids.join(", ");
    segments
        .map_err(move |e| {
            error!(content_ids = %sources, "chat stream failed: {}", e);
            LecternError::Generation(format!("chat over [{}] failed: {}", sources, e))
        })
        .boxed()
}

/// Result of ingesting content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestResult {
    pub content_id: String,
    /// Number of chunks stored.
    pub chunks_indexed: usize,
    /// How many of those use the digest fallback embedding.
    pub fallback_chunks: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::stream::{frame_segment, END_OF_STREAM};
    use crate::testing::{FailingEmbedder, KeywordEmbedder, ScriptedGenerator};
    use futures::StreamExt;

    fn orchestrator(
        embedder: Arc<dyn Embedder>,
        generator: Arc<ScriptedGenerator>,
    ) -> Orchestrator {
        Orchestrator::with_components(
            Settings::default(),
            Prompts::default(),
            embedder,
            generator,
            Arc::new(MemoryStore::new()),
        )
    }

    fn keyword_orchestrator(generator: Arc<ScriptedGenerator>) -> Orchestrator {
        orchestrator(
            Arc::new(KeywordEmbedder::new(&["photosynthesis", "chlorophyll", "rome"])),
            generator,
        )
    }

    #[tokio::test]
    async fn test_ingest_exact_chunk_size() {
        let orchestrator = keyword_orchestrator(Arc::new(ScriptedGenerator::default()));
        let text = "x".repeat(1000);

        let result = orchestrator.ingest("doc", &text).await.unwrap();
        assert_eq!(result.chunks_indexed, 1);
        assert_eq!(result.fallback_chunks, 0);

        let records = orchestrator.store().get_all("doc").await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].chunk_text, text);
    }

    #[tokio::test]
    async fn test_ingest_stores_chunks_in_order() {
        let orchestrator = keyword_orchestrator(Arc::new(ScriptedGenerator::default()));
        let text: String = (0..2500).map(|i| char::from(b'a' + (i % 26) as u8)).collect();

        orchestrator.ingest("doc", &text).await.unwrap();

        let records = orchestrator.store().get_all("doc").await.unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].chunk_text, text[800..1800]);
        assert_eq!(records[2].chunk_text, text[1600..]);
    }

    #[tokio::test]
    async fn test_ingest_empty_text_stores_nothing() {
        let orchestrator = keyword_orchestrator(Arc::new(ScriptedGenerator::default()));
        let result = orchestrator.ingest("doc", "").await.unwrap();
        assert_eq!(result.chunks_indexed, 0);
        assert!(orchestrator.store().get_all("doc").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ingest_rejects_invalid_chunking() {
        let mut settings = Settings::default();
        settings.chunking.overlap = settings.chunking.chunk_size;
        let orchestrator = Orchestrator::with_components(
            settings,
            Prompts::default(),
            Arc::new(FailingEmbedder::new(768)),
            Arc::new(ScriptedGenerator::default()),
            Arc::new(MemoryStore::new()),
        );

        let err = orchestrator.ingest("doc", "some text").await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidInput(_)));
        assert_eq!(orchestrator.store().record_count("doc").unwrap(), 0);

        let err = orchestrator.ingest("  ", "some text").await.unwrap_err();
        assert!(matches!(err, LecternError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_ingest_with_service_down_uses_fallback() {
        let orchestrator = orchestrator(
            Arc::new(FailingEmbedder::new(768)),
            Arc::new(ScriptedGenerator::default()),
        );

        let result = orchestrator.ingest("doc", "hello").await.unwrap();
        assert_eq!(result.fallback_chunks, 1);

        let records = orchestrator.store().get_all("doc").await.unwrap();
        assert_eq!(records[0].embedding.len(), 768);
        assert_eq!(
            orchestrator.search("doc", "hello", 5).await.unwrap(),
            vec!["hello"]
        );
    }

    #[tokio::test]
    async fn test_ingest_content_registers_text() {
        let orchestrator = keyword_orchestrator(Arc::new(ScriptedGenerator::default()));
        let result = orchestrator
            .ingest_content(ContentType::Pdf, "Photosynthesis uses chlorophyll.")
            .await
            .unwrap();

        assert!(Uuid::parse_str(&result.content_id).is_ok());
        let context = orchestrator
            .assemble_broad_context(&[result.content_id.clone()])
            .await
            .unwrap();
        assert_eq!(context, "Photosynthesis uses chlorophyll.\n\n");
    }

    #[tokio::test]
    async fn test_chat_stream_is_framed() {
        let generator = Arc::new(ScriptedGenerator::streaming(&["Chloro", "phyll"]));
        let orchestrator = keyword_orchestrator(generator.clone());
        let bio = orchestrator
            .ingest_content(ContentType::Youtube, "Chlorophyll drives photosynthesis.")
            .await
            .unwrap();

        let events: Vec<String> = orchestrator
            .chat_stream(&[bio.content_id], "What is chlorophyll?", &[])
            .await
            .unwrap()
            .map(|e| e.unwrap())
            .collect()
            .await;

        assert_eq!(
            events,
            vec![
                frame_segment("Chloro"),
                frame_segment("phyll"),
                END_OF_STREAM.to_string()
            ]
        );
        assert!(generator.prompts()[0].contains("Chlorophyll drives photosynthesis."));
    }

    #[tokio::test]
    async fn test_chat_stream_propagates_generation_failure() {
        let generator = Arc::new(ScriptedGenerator::streaming(&["one", "two"]).failing_after(1));
        let orchestrator = keyword_orchestrator(generator);

        let events: Vec<Result<String>> = orchestrator
            .chat_stream(&["doc".to_string()], "Anything?", &[])
            .await
            .unwrap()
            .collect()
            .await;

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].as_ref().unwrap(), &frame_segment("one"));
        match &events[1] {
            Err(LecternError::Generation(message)) => {
                assert!(message.starts_with("chat over [doc] failed:"), "{}", message);
                assert!(message.contains("stream interrupted"));
            }
            other => panic!("expected a generation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_history_and_clear_all() {
        let orchestrator = keyword_orchestrator(Arc::new(ScriptedGenerator::default()));
        let result = orchestrator
            .ingest_content(ContentType::Pdf, "Rome was not built in a day.")
            .await
            .unwrap();
        let id = result.content_id;

        orchestrator.record_turn(&id, ChatTurn::user("Who built Rome?")).await.unwrap();
        orchestrator
            .record_turn(&id, ChatTurn::assistant("Many people."))
            .await
            .unwrap();
        assert_eq!(orchestrator.history(&id).await.unwrap().len(), 2);

        orchestrator.clear_all().await.unwrap();

        assert!(orchestrator.history(&id).await.unwrap().is_empty());
        assert!(orchestrator.search(&id, "rome", 5).await.unwrap().is_empty());
        assert_eq!(orchestrator.assemble_broad_context(&[id]).await.unwrap(), "\n\n");
    }
}
