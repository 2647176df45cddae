//! Ollama chat client for running the pipeline against a local model.

use super::{ClientSettings, ModelClient};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Message in the chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ChatMessage,
}

/// Client for a local Ollama server.
pub struct OllamaClient {
    settings: ClientSettings,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(settings: ClientSettings) -> Result<Self> {
        let http_client = settings.http_client()?;
        Ok(Self {
            settings,
            http_client,
        })
    }
}

#[async_trait]
impl ModelClient for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/chat", self.settings.api_url);

        let request = OllamaChatRequest {
            model: self.settings.model_name.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            stream: false,
            options: OllamaOptions {
                temperature: self.settings.temperature,
            },
        };

        debug!("Sending chat request to {}", url);

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.settings.describe_send_error("Ollama", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Ollama API error {}: {}", status, body));
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(chat_response.message.content)
    }

    fn model_name(&self) -> &str {
        &self.settings.model_name
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }
}
