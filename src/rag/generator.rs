//! Text generation over an OpenAI-compatible chat API.

use crate::config::{GenerationSettings, ProviderSettings};
use crate::error::{LecternError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use tracing::{debug, instrument};

/// Lazily produced text segments. Dropping the stream stops consumption of
/// the underlying response.
pub type TextStream = BoxStream<'static, Result<String>>;

/// Trait for the text generation service.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a complete response for `prompt`.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a response for `prompt` as incremental segments.
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream>;
}

/// Generator backed by chat completions. The whole prompt is sent as a
/// single user message.
pub struct OpenAIGenerator {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAIGenerator {
    /// Create a generator from settings.
    pub fn new(provider: &ProviderSettings, generation: &GenerationSettings) -> Result<Self> {
        Ok(Self {
            client: create_client(provider)?,
            model: generation.model.clone(),
            temperature: generation.temperature,
        })
    }

    fn request(&self, prompt: &str) -> Result<CreateChatCompletionRequest> {
        let message = ChatCompletionRequestUserMessageArgs::default()
            .content(prompt)
            .build()
            .map_err(|e| LecternError::Generation(e.to_string()))?;

        CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(vec![message.into()])
            .temperature(self.temperature)
            .build()
            .map_err(|e| LecternError::Generation(e.to_string()))
    }
}

#[async_trait]
impl Generator for OpenAIGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate(&self, prompt: &str) -> Result<String> {
        let request = self.request(prompt)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            LecternError::OpenAI(format!("Failed to generate response: {}", e))
        })?;

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LecternError::Generation("Empty response from LLM".to_string()))?;

        debug!("Generated {} characters", text.len());
        Ok(text)
    }

    #[instrument(skip(self, prompt), fields(model = %self.model))]
    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        let request = self.request(prompt)?;

        let stream = self.client.chat().create_stream(request).await.map_err(|e| {
            LecternError::OpenAI(format!("Failed to start response stream: {}", e))
        })?;

        let segments = stream.filter_map(|item| {
            future::ready(match item {
                Ok(response) => {
                    let text: String = response
                        .choices
                        .into_iter()
                        .filter_map(|c| c.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(e) => Some(Err(LecternError::OpenAI(format!(
                    "Response stream failed: {}",
                    e
                )))),
            })
        });

        Ok(segments.boxed())
    }
}
