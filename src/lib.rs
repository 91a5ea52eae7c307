//! Lectern - study assistant over documents and transcripts
//!
//! A local-first tool for turning extracted course material into something
//! you can question and revise from.
//!
//! # Overview
//!
//! Lectern allows you to:
//! - Chunk and embed text extracted from PDFs and video transcripts
//! - Search a source for the passages most similar to a query
//! - Chat about one or more sources with streamed, context-grounded answers
//! - Generate flashcards and multiple-choice quizzes
//!
//! Embeddings degrade gracefully: when the embedding service is unreachable a
//! deterministic digest-based vector is stored instead, so ingestion and
//! search keep working with weaker relevance.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management
//! - `chunking` - Fixed-size overlapping text windows
//! - `embedding` - Embedding generation with offline fallback
//! - `vector_store` - In-memory embeddings, content and chat history
//! - `rag` - Similarity search, prompt assembly and generation
//! - `orchestrator` - Pipeline coordination
//!
//! # Example
//!
//! ```rust,no_run
//! use lectern::config::Settings;
//! use lectern::orchestrator::Orchestrator;
//! use lectern::vector_store::ContentType;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let orchestrator = Orchestrator::new(settings)?;
//!
//!     let text = std::fs::read_to_string("lecture-notes.txt")?;
//!     let result = orchestrator.ingest_content(ContentType::Pdf, &text).await?;
//!     println!("Indexed {} chunks", result.chunks_indexed);
//!
//!     let hits = orchestrator.search(&result.content_id, "photosynthesis", 5).await?;
//!     println!("{:?}", hits);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;

#[cfg(test)]
mod testing;

pub use error::{LecternError, Result};
