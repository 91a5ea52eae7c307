//! Test doubles for the embedding and generation services.

use crate::config::ProviderSettings;
use crate::embedding::Embedder;
use crate::error::{LecternError, Result};
use crate::rag::{Generator, TextStream};
use async_trait::async_trait;
use axum::http::{header, StatusCode};
use axum::Router;
use futures::stream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Embeds text as keyword occurrence counts over a fixed vocabulary.
pub struct KeywordEmbedder {
    vocabulary: Vec<String>,
    reported_dimensions: Option<usize>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&str]) -> Self {
        Self {
            vocabulary: vocabulary.iter().map(|w| w.to_string()).collect(),
            reported_dimensions: None,
        }
    }

    /// Report a dimensionality that differs from the vectors actually produced.
    pub fn with_reported_dimensions(mut self, dimensions: usize) -> Self {
        self.reported_dimensions = Some(dimensions);
        self
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let text = text.to_lowercase();
        Ok(self
            .vocabulary
            .iter()
            .map(|word| text.matches(word.as_str()).count() as f32)
            .collect())
    }

    fn dimensions(&self) -> usize {
        self.reported_dimensions.unwrap_or(self.vocabulary.len())
    }
}

/// Embedder whose service is always down.
pub struct FailingEmbedder {
    dimensions: usize,
}

impl FailingEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(LecternError::OpenAI("quota exceeded".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Generator that replays fixed output and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    segments: Vec<String>,
    completion: String,
    fail_after: Option<usize>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    /// Stream the given segments.
    pub fn streaming(segments: &[&str]) -> Self {
        Self {
            segments: segments.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }

    /// Return `completion` from non-streaming calls.
    pub fn completing(completion: &str) -> Self {
        Self {
            completion: completion.to_string(),
            ..Self::default()
        }
    }

    /// Fail the stream after yielding `count` segments.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after = Some(count);
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.completion.clone())
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let mut items: Vec<Result<String>> = self.segments.iter().cloned().map(Ok).collect();
        if let Some(count) = self.fail_after {
            items.truncate(count);
            items.push(Err(LecternError::Generation("stream interrupted".to_string())));
            items.push(Ok("never delivered".to_string()));
        }

        Ok(Box::pin(stream::iter(items)))
    }
}

const RATE_LIMITED_BODY: &str = r#"{"error":{"message":"Resource has been exhausted (e.g. check quota).","type":"rate_limit_exceeded","param":null,"code":"RESOURCE_EXHAUSTED"}}"#;

/// Start a local provider that answers every request with HTTP 429.
///
/// Returns settings pointing at it and a counter of requests received.
pub async fn rate_limited_provider() -> (ProviderSettings, Arc<AtomicUsize>) {
    let requests = Arc::new(AtomicUsize::new(0));
    let counter = requests.clone();

    let app = Router::new().fallback(move || {
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            (
                StatusCode::TOO_MANY_REQUESTS,
                [(header::CONTENT_TYPE, "application/json")],
                RATE_LIMITED_BODY,
            )
        }
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let provider = ProviderSettings {
        api_base: format!("http://{}", addr),
        api_key_env: "LECTERN_TEST_API_KEY".to_string(),
        timeout_secs: 5,
    };
    (provider, requests)
}
