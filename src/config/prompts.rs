//! Prompt templates for Lectern.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub chat: ChatPrompts,
    pub study: StudyPrompts,
}

/// Prompts for retrieval-augmented chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// Instructional preamble placed before the retrieved context.
    pub preamble: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            preamble: r#"You are a helpful AI tutor. Answer questions based on the following content.
If the answer is not in the content, say so politely."#
                .to_string(),
        }
    }
}

/// Prompts for flashcard and quiz generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyPrompts {
    pub flashcards: String,
    pub quiz: String,
}

impl Default for StudyPrompts {
    fn default() -> Self {
        Self {
            flashcards: r#"Based on the following content, generate 10-15 educational flashcards.
Each flashcard should have a 'front' (question/term) and 'back' (answer/definition).

Content:
{{content}}

Return ONLY a JSON array in this exact format:
[
  {"front": "Question or term", "back": "Answer or definition"},
  ...
]"#
            .to_string(),

            quiz: r#"Based on the following content, generate 5-10 multiple-choice quiz questions.
Each question should have 4 options and indicate the correct answer index (0-3).

Content:
{{content}}

Return ONLY a JSON array in this exact format:
[
  {
    "question": "Question text?",
    "options": ["Option A", "Option B", "Option C", "Option D"],
    "correct_answer": 0
  },
  ...
]"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts, applying overrides from a custom directory if given.
    pub fn load(custom_dir: Option<&str>) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }

            let study_path = custom_path.join("study.toml");
            if study_path.exists() {
                let content = std::fs::read_to_string(&study_path)?;
                prompts.study = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a study template with the combined source content.
    pub fn render_study(template: &str, content: &str) -> String {
        let mut vars = HashMap::new();
        vars.insert("content".to_string(), content.to_string());
        Self::render(template, &vars)
    }
}
