//! Mock chat backend for deterministic testing.
//!
//! Returns scripted responses without touching the network, and records
//! every prompt it receives so tests can assert on what was sent.
//!
//! ## Usage
//!
//! ```rust
//! use tagmill_inference::MockBackend;
//! use tagmill_core::ChatBackend;
//!
//! # async fn demo() {
//! let backend = MockBackend::new().with_fixed_response(r#"{"title": "Invoice"}"#);
//! let outcome = backend.send_chat("system", "user").await.unwrap();
//! assert_eq!(outcome.text, r#"{"title": "Invoice"}"#);
//! assert_eq!(backend.call_count(), 1);
//! # }
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tagmill_core::{ChatBackend, ChatOutcome, Error, Result, UsageMetrics};

/// Mock chat backend for testing.
#[derive(Clone)]
pub struct MockBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    model: String,
    fixed_responses: HashMap<String, String>,
    default_response: String,
    usage: UsageMetrics,
    fail: bool,
}

/// A recorded call, for assertions.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub system: String,
    pub user: String,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            model: "mock-model".to_string(),
            fixed_responses: HashMap::new(),
            default_response: "{}".to_string(),
            usage: UsageMetrics::default(),
            fail: false,
        }
    }
}

impl MockBackend {
    /// Create a new mock backend with default configuration.
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set the reported model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// Set the response returned for any prompt without a specific mapping.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Map a specific user prompt to a specific response.
    pub fn with_response_mapping(
        mut self,
        prompt: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .fixed_responses
            .insert(prompt.into(), response.into());
        self
    }

    /// Set the usage metrics reported with each response.
    pub fn with_usage(mut self, usage: UsageMetrics) -> Self {
        Arc::make_mut(&mut self.config).usage = usage;
        self
    }

    /// Make every call fail with [`Error::BackendUnavailable`].
    pub fn with_failure(mut self) -> Self {
        Arc::make_mut(&mut self.config).fail = true;
        self
    }

    /// Get all logged calls for assertion.
    pub fn calls(&self) -> Vec<MockCall> {
        self.call_log.lock().unwrap().clone()
    }

    /// Number of calls received so far.
    pub fn call_count(&self) -> usize {
        self.call_log.lock().unwrap().len()
    }

    /// Clear the call log.
    pub fn clear_calls(&self) {
        self.call_log.lock().unwrap().clear()
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatBackend for MockBackend {
    async fn send_chat(&self, system: &str, user: &str) -> Result<ChatOutcome> {
        self.call_log.lock().unwrap().push(MockCall {
            system: system.to_string(),
            user: user.to_string(),
        });

        if self.config.fail {
            return Err(Error::BackendUnavailable(
                "mock backend configured to fail".to_string(),
            ));
        }

        let text = self
            .config
            .fixed_responses
            .get(user)
            .cloned()
            .unwrap_or_else(|| self.config.default_response.clone());

        Ok(ChatOutcome {
            text,
            usage: self.config.usage,
        })
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_response() {
        let backend = MockBackend::new();
        let outcome = backend.send_chat("sys", "anything").await.unwrap();
        assert_eq!(outcome.text, "{}");
        assert!(outcome.usage.is_empty());
    }

    #[tokio::test]
    async fn test_response_mapping_wins_over_default() {
        let backend = MockBackend::new()
            .with_fixed_response("default")
            .with_response_mapping("specific prompt", "specific reply");

        let mapped = backend.send_chat("", "specific prompt").await.unwrap();
        assert_eq!(mapped.text, "specific reply");

        let fallback = backend.send_chat("", "other prompt").await.unwrap();
        assert_eq!(fallback.text, "default");
    }

    #[tokio::test]
    async fn test_call_log_records_prompts() {
        let backend = MockBackend::new();
        backend.send_chat("system text", "user text").await.unwrap();

        let calls = backend.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].system, "system text");
        assert_eq!(calls[0].user, "user text");

        backend.clear_calls();
        assert_eq!(backend.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_mode() {
        let backend = MockBackend::new().with_failure();
        let err = backend.send_chat("", "prompt").await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable(_)));
        // Calls are still recorded on failure
        assert_eq!(backend.call_count(), 1);
    }

    #[tokio::test]
    async fn test_usage_reporting() {
        let usage = UsageMetrics {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        };
        let backend = MockBackend::new().with_usage(usage);
        let outcome = backend.send_chat("", "p").await.unwrap();
        assert_eq!(outcome.usage.total_tokens, 15);
    }
}
