//! RAG (Retrieval-Augmented Generation) over ingested content.
//!
//! Similarity search ranks a source's chunks against a query, the context
//! assembler turns search results and conversation turns into prompts, and
//! the engine hands those prompts to the generation service.

pub mod context;
mod generator;
mod response;
mod search;
pub mod stream;

pub use context::ContextAssembler;
pub use generator::{Generator, OpenAIGenerator, TextStream};
pub use response::{extract_json_block, Flashcard, QuizQuestion, RagEngine};
pub use search::{rank, SearchResult, SimilaritySearch};
