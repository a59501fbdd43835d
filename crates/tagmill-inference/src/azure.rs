//! Azure OpenAI chat backend implementation.
//!
//! Same body shape as the OpenAI-compatible backend, but the URL is scoped
//! to a deployment and authentication uses the `api-key` header instead of
//! a bearer token.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use tagmill_core::{defaults, ChatBackend, ChatOutcome, Error, Result, UsageMetrics};

use crate::openai::types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, OpenAIErrorResponse,
};

/// Configuration for the Azure OpenAI backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    /// API key sent in the `api-key` header.
    pub api_key: String,
    /// Deployment name; Azure routes by deployment, not by model id.
    pub deployment: String,
    /// API version query parameter.
    pub api_version: String,
    /// Cap on response tokens.
    pub max_tokens: Option<u32>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            api_key: String::new(),
            deployment: String::new(),
            api_version: defaults::AZURE_API_VERSION.to_string(),
            max_tokens: Some(defaults::RESERVED_RESPONSE_TOKENS as u32),
            timeout_seconds: defaults::CHAT_TIMEOUT_SECS,
        }
    }
}

/// Azure OpenAI chat backend.
pub struct AzureBackend {
    client: Client,
    config: AzureConfig,
}

impl AzureBackend {
    /// Create a new Azure backend with the given configuration.
    ///
    /// Fails with [`Error::BackendUnavailable`] when endpoint, key, or
    /// deployment are missing.
    pub fn new(config: AzureConfig) -> Result<Self> {
        if config.endpoint.is_empty() {
            return Err(Error::BackendUnavailable(
                "Azure endpoint is not configured".to_string(),
            ));
        }
        if config.api_key.is_empty() {
            return Err(Error::BackendUnavailable(
                "Azure API key is not configured".to_string(),
            ));
        }
        if config.deployment.is_empty() {
            return Err(Error::BackendUnavailable(
                "Azure deployment is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::BackendUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing Azure backend: endpoint={}, deployment={}",
            config.endpoint, config.deployment
        );

        Ok(Self { client, config })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.config.endpoint.trim_end_matches('/'),
            self.config.deployment,
            self.config.api_version
        )
    }
}

#[async_trait]
impl ChatBackend for AzureBackend {
    async fn send_chat(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        let start = Instant::now();
        debug!(
            subsystem = "inference",
            component = "azure",
            model = %self.config.deployment,
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
            // Azure resolves the model from the deployment in the URL; the
            // body field is still sent for compatible gateways.
            model: self.config.deployment.clone(),
            messages,
            temperature: None,
            max_tokens: self.config.max_tokens,
            stream: false,
        };

        let response = self
            .client
            .post(self.completions_url())
            .header("api-key", &self.config.api_key)
            .header("Content-Type", "application/json")
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
                "Azure returned {}: {}",
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

        debug!(
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion done"
        );

        Ok(ChatOutcome { text, usage })
    }

    fn model_name(&self) -> &str {
        &self.config.deployment
    }
}
