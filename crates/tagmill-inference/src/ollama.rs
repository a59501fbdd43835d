//! Ollama chat backend implementation.
//!
//! Uses the `/api/generate` endpoint with separate `system` and `prompt`
//! fields rather than a messages array, plus `format: "json"` so the model
//! is constrained to valid JSON output. Ollama does not report token usage,
//! so usage metrics come back zeroed.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use tagmill_core::{
    defaults, estimate_tokens, ChatBackend, ChatOutcome, Error, Result, UsageMetrics,
};

/// Sampling options forwarded to Ollama.
///
/// Defaults were tuned for small local models; all of them are configurable
/// because the right values vary by model family.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingOptions {
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repeat_penalty: f32,
}

impl Default for SamplingOptions {
    fn default() -> Self {
        Self {
            temperature: defaults::OLLAMA_TEMPERATURE,
            top_p: defaults::OLLAMA_TOP_P,
            top_k: defaults::OLLAMA_TOP_K,
            repeat_penalty: defaults::OLLAMA_REPEAT_PENALTY,
        }
    }
}

/// Configuration for the Ollama backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to use for generation.
    pub model: String,
    /// Sampling parameters.
    pub sampling: SamplingOptions,
    /// Maximum tokens the model may generate (`num_predict`).
    pub num_predict: u32,
    /// Request timeout in seconds. Local models are slow; the default is
    /// thirty minutes.
    pub timeout_seconds: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OLLAMA_URL.to_string(),
            model: defaults::OLLAMA_GEN_MODEL.to_string(),
            sampling: SamplingOptions::default(),
            num_predict: defaults::RESERVED_RESPONSE_TOKENS as u32,
            timeout_seconds: defaults::OLLAMA_TIMEOUT_SECS,
        }
    }
}

/// Ollama chat backend.
pub struct OllamaBackend {
    client: Client,
    config: OllamaConfig,
}

/// Request payload for the Ollama `/api/generate` endpoint.
#[derive(Serialize)]
struct GenerateRequest {
    model: String,
    system: String,
    prompt: String,
    stream: bool,
    /// Ollama format enforcement. `"json"` guarantees valid JSON output.
    format: String,
    options: GenerateOptions,
}

/// Model options for the generate endpoint.
#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repeat_penalty: f32,
    num_predict: u32,
    /// Context window sized to the actual prompt, so small machines are not
    /// asked to allocate a default-sized KV cache for a short prompt.
    num_ctx: usize,
}

impl OllamaBackend {
    /// Create a new Ollama backend with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
        if config.base_url.is_empty() {
            return Err(Error::BackendUnavailable(
                "Ollama base URL is not configured".to_string(),
            ));
        }
        if config.model.is_empty() {
            return Err(Error::BackendUnavailable(
                "Ollama model is not configured".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::BackendUnavailable(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "Initializing Ollama backend: url={}, model={}, timeout={}s",
            config.base_url, config.model, config.timeout_seconds
        );

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }

    /// Context window for a given prompt: prompt estimate plus the response
    /// reserve, floored so tiny prompts still get a workable window.
    fn num_ctx_for(&self, system: &str, user: &str) -> usize {
        let prompt_tokens =
            estimate_tokens(system, &self.config.model) + estimate_tokens(user, &self.config.model);
        (prompt_tokens + self.config.num_predict as usize).max(defaults::OLLAMA_NUM_CTX_MIN)
    }
}

#[async_trait]
impl ChatBackend for OllamaBackend {
    async fn send_chat(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        let start = Instant::now();
        let num_ctx = self.num_ctx_for(system, user);

        debug!(
            subsystem = "inference",
            component = "ollama",
            model = %self.config.model,
            prompt_len = user.len(),
            num_ctx = num_ctx,
            "Sending generate request"
        );

        let request = GenerateRequest {
            model: self.config.model.clone(),
            system: system.to_string(),
            prompt: user.to_string(),
            stream: false,
            format: "json".to_string(),
            options: GenerateOptions {
                temperature: self.config.sampling.temperature,
                top_p: self.config.sampling.top_p,
                top_k: self.config.sampling.top_k,
                repeat_penalty: self.config.sampling.repeat_penalty,
                num_predict: self.config.num_predict,
                num_ctx,
            },
        };

        let response = self
            .client
            .post(format!(
                "{}/api/generate",
                self.config.base_url.trim_end_matches('/')
            ))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Request(format!(
                "Ollama returned {}: {}",
                status, body
            )));
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::InvalidResponseShape(format!("Failed to parse response: {}", e)))?;

        let text = value
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::InvalidResponseShape("response field missing from generate reply".to_string())
            })?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            response_len = text.len(),
            duration_ms = elapsed,
            "Generate request done"
        );
        if elapsed > 60_000 {
            warn!(
                duration_ms = elapsed,
                model = %self.config.model,
                slow = true,
                "Slow local generation"
            );
        }

        // The generate endpoint reports no token usage.
        Ok(ChatOutcome {
            text,
            usage: UsageMetrics::default(),
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // Configuration Tests
    // ==========================================================================

    #[test]
    fn test_default_config() {
        let config = OllamaConfig::default();
        assert_eq!(config.base_url, defaults::OLLAMA_URL);
        assert_eq!(config.model, defaults::OLLAMA_GEN_MODEL);
        assert_eq!(config.timeout_seconds, defaults::OLLAMA_TIMEOUT_SECS);
        assert_eq!(config.num_predict as usize, defaults::RESERVED_RESPONSE_TOKENS);
    }

    #[test]
    fn test_default_sampling() {
        let sampling = SamplingOptions::default();
        assert_eq!(sampling.temperature, defaults::OLLAMA_TEMPERATURE);
        assert_eq!(sampling.top_p, defaults::OLLAMA_TOP_P);
        assert_eq!(sampling.top_k, defaults::OLLAMA_TOP_K);
        assert_eq!(sampling.repeat_penalty, defaults::OLLAMA_REPEAT_PENALTY);
    }

    #[test]
    fn test_backend_rejects_empty_url() {
        let config = OllamaConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            OllamaBackend::new(config),
            Err(Error::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_backend_rejects_empty_model() {
        let config = OllamaConfig {
            model: String::new(),
            ..Default::default()
        };
        assert!(matches!(
            OllamaBackend::new(config),
            Err(Error::BackendUnavailable(_))
        ));
    }

    // ==========================================================================
    // Context Window Tests
    // ==========================================================================

    #[test]
    fn test_num_ctx_has_floor() {
        let backend = OllamaBackend::new(OllamaConfig::default()).unwrap();
        let ctx = backend.num_ctx_for("short", "prompt");
        assert_eq!(ctx, defaults::OLLAMA_NUM_CTX_MIN);
    }

    #[test]
    fn test_num_ctx_grows_with_prompt() {
        let backend = OllamaBackend::new(OllamaConfig::default()).unwrap();
        let long_prompt = "word ".repeat(4000);
        let ctx = backend.num_ctx_for("", &long_prompt);
        assert!(ctx > defaults::OLLAMA_NUM_CTX_MIN);
        assert!(ctx >= estimate_tokens(&long_prompt, &backend.config.model));
    }

    // ==========================================================================
    // Wire Shape Tests
    // ==========================================================================

    #[test]
    fn test_generate_request_serialization() {
        let request = GenerateRequest {
            model: "llama3.1:8b".to_string(),
            system: "Extract metadata.".to_string(),
            prompt: "Document text".to_string(),
            stream: false,
            format: "json".to_string(),
            options: GenerateOptions {
                temperature: 0.7,
                top_p: 0.9,
                top_k: 7,
                repeat_penalty: 1.1,
                num_predict: 1000,
                num_ctx: 4096,
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["format"], "json");
        assert_eq!(json["system"], "Extract metadata.");
        assert_eq!(json["prompt"], "Document text");
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_ctx"], 4096);
        assert_eq!(json["options"]["top_k"], 7);
    }
}
