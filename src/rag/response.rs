//! RAG response generation.

use super::{ContextAssembler, Generator, TextStream};
use crate::config::{Prompts, StudyPrompts};
use crate::error::Result;
use crate::vector_store::ChatTurn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// A question/answer study card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
}

/// A multiple-choice question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Index into `options`.
    pub correct_answer: usize,
}

/// RAG engine: chat answers, flashcards and quizzes over stored content.
pub struct RagEngine {
    assembler: ContextAssembler,
    generator: Arc<dyn Generator>,
    prompts: StudyPrompts,
}

impl RagEngine {
    /// Create a new RAG engine.
    pub fn new(assembler: ContextAssembler, generator: Arc<dyn Generator>) -> Self {
        Self {
            assembler,
            generator,
            prompts: StudyPrompts::default(),
        }
    }

    /// Set custom study prompts.
    pub fn with_prompts(mut self, prompts: StudyPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn assembler(&self) -> &ContextAssembler {
        &self.assembler
    }

    /// Answer `message` from the given sources, streaming the raw segments.
    #[instrument(skip(self, message, history), fields(sources = content_ids.len()))]
    pub async fn chat(
        &self,
        content_ids: &[String],
        message: &str,
        history: &[ChatTurn],
    ) -> Result<TextStream> {
        info!("Chat message over {:?}", content_ids);
        let prompt = self.assembler.assemble(content_ids, message, history).await?;
        self.generator.generate_stream(&prompt).await
    }

    /// Generate flashcards covering the given sources.
    #[instrument(skip(self), fields(sources = content_ids.len()))]
    pub async fn generate_flashcards(&self, content_ids: &[String]) -> Result<Vec<Flashcard>> {
        let context = self.assembler.assemble_broad_context(content_ids).await?;
        let prompt = Prompts::render_study(&self.prompts.flashcards, &context);
        let response = self.generator.generate(&prompt).await?;

        Ok(parse_or_placeholder(&response, || Flashcard {
            front: "Sample Question".to_string(),
            back: "Sample Answer".to_string(),
        }))
    }

    /// Generate multiple-choice questions covering the given sources.
    #[instrument(skip(self), fields(sources = content_ids.len()))]
    pub async fn generate_quiz(&self, content_ids: &[String]) -> Result<Vec<QuizQuestion>> {
        let context = self.assembler.assemble_broad_context(content_ids).await?;
        let prompt = Prompts::render_study(&self.prompts.quiz, &context);
        let response = self.generator.generate(&prompt).await?;

        Ok(parse_or_placeholder(&response, || QuizQuestion {
            question: "Sample question?".to_string(),
            options: ["A", "B", "C", "D"].iter().map(|o| o.to_string()).collect(),
            correct_answer: 0,
        }))
    }
}

/// Strip a surrounding markdown code fence from a model response, if any.
pub fn extract_json_block(response: &str) -> &str {
    let body = if let Some((_, rest)) = response.split_once("```json") {
        rest
    } else if let Some((_, rest)) = response.split_once("```") {
        rest
    } else {
        return response.trim();
    };

    body.split("```").next().unwrap_or(body).trim()
}

/// Parse a JSON array from a model response, or a single placeholder item
/// when the response is not valid JSON.
fn parse_or_placeholder<T: DeserializeOwned>(
    response: &str,
    placeholder: impl FnOnce() -> T,
) -> Vec<T> {
    match serde_json::from_str(extract_json_block(response)) {
        Ok(items) => items,
        Err(e) => {
            warn!("Could not parse model output as JSON, using placeholder: {}", e);
            vec![placeholder()]
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::ResilientEmbedder;
    use crate::error::LecternError;
    use crate::rag::SimilaritySearch;
    use crate::testing::{KeywordEmbedder, ScriptedGenerator};
    use crate::vector_store::{Content, ContentRegistry, ContentType, MemoryStore};
    use futures::StreamExt;

    async fn engine(generator: Arc<ScriptedGenerator>) -> RagEngine {
        let store = Arc::new(MemoryStore::new());
        store
            .register(Content::new(
                "notes".to_string(),
                ContentType::Pdf,
                "Mitochondria are the powerhouse of the cell.".to_string(),
            ))
            .await
            .unwrap();

        let embedder = Arc::new(ResilientEmbedder::new(Arc::new(KeywordEmbedder::new(&["cell"]))));
        let search = SimilaritySearch::new(store.clone(), embedder);
        let assembler = ContextAssembler::new(search, store, "Preamble.");
        RagEngine::new(assembler, generator)
    }

    fn ids(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_json_block() {
        assert_eq!(extract_json_block("```json\n[1, 2]\n```"), "[1, 2]");
        assert_eq!(extract_json_block("Here you go:\n```\n[3]\n```\nEnjoy"), "[3]");
        assert_eq!(extract_json_block("  [4]  "), "[4]");
    }

    #[tokio::test]
    async fn test_flashcards_parse_fenced_json() {
        let generator = Arc::new(ScriptedGenerator::completing(
            "```json\n[{\"front\": \"Powerhouse?\", \"back\": \"Mitochondria\"}]\n```",
        ));
        let engine = engine(generator.clone()).await;

        let cards = engine.generate_flashcards(&ids(&["notes"])).await.unwrap();
        assert_eq!(
            cards,
            vec![Flashcard {
                front: "Powerhouse?".to_string(),
                back: "Mitochondria".to_string(),
            }]
        );

        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("Content:\nMitochondria are the powerhouse of the cell.\n\n"));
        assert!(prompts[0].contains("educational flashcards"));
    }

    #[tokio::test]
    async fn test_flashcards_placeholder_on_bad_json() {
        let generator = Arc::new(ScriptedGenerator::completing("I cannot do that."));
        let engine = engine(generator).await;

        let cards = engine.generate_flashcards(&ids(&["notes"])).await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].front, "Sample Question");
        assert_eq!(cards[0].back, "Sample Answer");
    }

    #[tokio::test]
    async fn test_quiz_parsing_and_placeholder() {
        let generator = Arc::new(ScriptedGenerator::completing(
            r#"[{"question": "What is ATP?", "options": ["Energy", "Fat", "Salt", "DNA"], "correct_answer": 0}]"#,
        ));
        let quiz = engine(generator.clone())
            .await
            .generate_quiz(&ids(&["notes"]))
            .await
            .unwrap();
        assert_eq!(quiz.len(), 1);
        assert_eq!(quiz[0].options.len(), 4);
        assert!(generator.prompts()[0].contains("multiple-choice"));

        let generator = Arc::new(ScriptedGenerator::completing("{not json"));
        let quiz = engine(generator).await.generate_quiz(&ids(&["notes"])).await.unwrap();
        assert_eq!(quiz[0].question, "Sample question?");
        assert_eq!(quiz[0].options, vec!["A", "B", "C", "D"]);
    }

    #[tokio::test]
    async fn test_chat_streams_segments() {
        let generator = Arc::new(ScriptedGenerator::streaming(&["The ", "cell."]));
        let engine = engine(generator.clone()).await;

        let segments: Vec<String> = engine
            .chat(&ids(&["notes"]), "What about the cell?", &[ChatTurn::user("Hi")])
            .await
            .unwrap()
            .map(|s| s.unwrap())
            .collect()
            .await;

        assert_eq!(segments, vec!["The ", "cell."]);
        let prompt = &generator.prompts()[0];
        assert!(prompt.starts_with("Preamble.\n\nContent:\n"));
        assert!(prompt.ends_with("user: Hi\nuser: What about the cell?\nassistant: "));
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_message_before_generation() {
        let generator = Arc::new(ScriptedGenerator::streaming(&["unused"]));
        let engine = engine(generator.clone()).await;

        let err = engine.chat(&ids(&["notes"]), "", &[]).await.err().unwrap();
        assert!(matches!(err, LecternError::InvalidInput(_)));
        assert!(generator.prompts().is_empty());
    }
}
