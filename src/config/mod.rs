//! Configuration module for Lectern.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{ChatPrompts, Prompts, StudyPrompts};
pub use settings::{
    ChunkingSettings, EmbeddingSettings, GenerationSettings, PromptSettings, ProviderSettings,
    RagSettings, ServerSettings, Settings,
};
