//! OpenAI-compatible chat backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use tagmill_core::{defaults, ChatBackend, ChatOutcome, Error, Result, UsageMetrics};

use super::types::*;

/// Configuration for the OpenAI-compatible backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAIConfig {
    /// Base URL for the API endpoint.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Model to use for generation.
    pub model: String,
    /// Sampling temperature, when the endpoint should not use its default.
    pub temperature: Option<f32>,
    /// Cap on response tokens, typically the reserved-response budget.
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            model: defaults::OPENAI_GEN_MODEL.to_string(),
            temperature: None,
            max_tokens: Some(defaults::RESERVED_RESPONSE_TOKENS as u32),
            timeout_seconds: defaults::CHAT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI-compatible chat backend.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    ///
    /// Fails with [`Error::BackendUnavailable`] when the configuration is
    /// unusable (empty base URL or model, or the HTTP client cannot be
    /// built).
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::BackendUnavailable(
                "OpenAI base URL is not configured".to_string(),
            ));
        }
        if config.model.is_empty() {
            return Err(Error::BackendUnavailable(
                "OpenAI model is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::BackendUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing OpenAI backend: url={}, model={}",
            config.base_url, config.model
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint);
        let mut req = self.client.post(&url);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }

        req.header("Content-Type", "application/json")
    }
}

#[async_trait]
impl ChatBackend for OpenAIBackend {
    async fn send_chat(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "openai",
            model = %self.config.model,
            prompt_len = user.len(),
            "Sending chat completion"
        );

        let mut messages = Vec::new();
        if !system.is_empty() {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: system.to_string(),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content: user.to_string(),
        });

        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response
                .json()
                .await
                .unwrap_or_else(|_| OpenAIErrorResponse::unknown());
            return Err(Error::Request(format!(
                "OpenAI returned {}: {}",
                status, body.error.message
            )));
        }

        let result: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponseShape(format!("Failed to parse response: {}", e)))?;

        let usage: UsageMetrics = result.usage.map(Into::into).unwrap_or_default();

        let text = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                Error::InvalidResponseShape("response contains no choices".to_string())
            })?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = text.len(),
            duration_ms = elapsed,
            total_tokens = usage.total_tokens,
            "Chat completion done"
        );
        if elapsed > 30_000 {
            warn!(duration_ms = elapsed, slow = true, "Slow chat completion");
        }

        Ok(ChatOutcome { text, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
