//! Client construction for OpenAI-compatible APIs.
//!
//! Embeddings and chat completions both go through `async-openai`, pointed at
//! whichever OpenAI-compatible endpoint the settings name (Gemini by default).

use crate::config::ProviderSettings;
use crate::error::{LecternError, Result};
use async_openai::{config::OpenAIConfig, Client};
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};
use std::time::Duration;
use tracing::warn;

/// Create a client for the configured provider.
///
/// A missing API key is not fatal here: embedding calls will fall back to the
/// digest embedding, and generation calls will report the upstream error.
pub fn create_client(provider: &ProviderSettings) -> Result<Client<OpenAIConfig>> {
    let api_key = match std::env::var(&provider.api_key_env) {
        Ok(key) => key,
        Err(_) => {
            warn!(
                "{} is not set; requests to {} will be unauthenticated",
                provider.api_key_env, provider.api_base
            );
            String::new()
        }
    };

    let config = OpenAIConfig::new()
        .with_api_base(&provider.api_base)
        .with_api_key(api_key);

    create_client_with_timeout(config, Duration::from_secs(provider.timeout_secs))
}

/// Backoff policy that gives up after the first failed attempt.
///
/// Rate-limit and server errors surface to the caller immediately, so a
/// failed embedding call falls back at once instead of waiting out retries.
pub fn no_retry() -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

/// Create a client from an explicit config with a custom timeout.
pub fn create_client_with_timeout(
    config: OpenAIConfig,
    timeout: Duration,
) -> Result<Client<OpenAIConfig>> {
    let http_client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LecternError::Config(format!("Failed to create HTTP client: {}", e)))?;

    Ok(Client::with_config(config)
        .with_http_client(http_client)
        .with_backoff(no_retry()))
}
