//! Model clients for the report pipeline.
//!
//! Every pipeline stage talks to the model through [`ModelClient`], a
//! single prompt-in, text-out call. Gemini is the default provider; a
//! local Ollama server can be used instead.

pub mod gemini;
pub mod ollama;

use crate::config::{ModelConfig, Provider};
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

pub use gemini::GeminiClient;
pub use ollama::OllamaClient;

/// A text-generation backend.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a single prompt and return the raw response text.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Model identifier used for requests.
    fn model_name(&self) -> &str;

    /// Short provider name (e.g. "gemini").
    fn provider_name(&self) -> &str;
}

/// Connection settings shared by the HTTP clients.
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub api_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl ClientSettings {
    /// Build settings from the resolved model configuration.
    pub fn from_config(config: &ModelConfig) -> Self {
        Self {
            api_url: config.effective_api_url().trim_end_matches('/').to_string(),
            model_name: config.effective_model(),
            temperature: config.temperature,
            timeout_seconds: config.timeout_seconds,
        }
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")
    }

    /// Turn a transport error into a message naming the endpoint.
    fn describe_send_error(&self, provider: &str, e: reqwest::Error) -> anyhow::Error {
        if e.is_timeout() {
            anyhow::anyhow!("Request timed out after {}s", self.timeout_seconds)
        } else if e.is_connect() {
            anyhow::anyhow!("Cannot connect to {} at {}", provider, self.api_url)
        } else {
            anyhow::anyhow!("Failed to send request: {}", e)
        }
    }
}

/// Create the client selected by the configuration.
pub fn create_client(config: &ModelConfig) -> Result<Box<dyn ModelClient>> {
    let settings = ClientSettings::from_config(config);

    match config.provider {
        Provider::Gemini => {
            let api_key = config.resolve_api_key().context(
                "Gemini API key not configured. Set GOOGLE_API_KEY, pass --api-key, \
                 add api_key to .ddrgen.toml or create api_key.txt",
            )?;
            Ok(Box::new(GeminiClient::new(settings, api_key)?))
        }
        Provider::Ollama => Ok(Box::new(OllamaClient::new(settings)?)),
    }
}
