//! Core traits for tagmill abstractions.
//!
//! These traits define the interfaces that concrete implementations must
//! satisfy, enabling pluggable backends and testability.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::UsageMetrics;

/// Raw output of one chat call: the model's text plus whatever usage the
/// backend reported (zeroed when unreported).
#[derive(Debug, Clone)]
pub struct ChatOutcome {
    /// Raw model output, before normalization.
    pub text: String,
    /// Token usage as reported by the backend.
    pub usage: UsageMetrics,
}

/// A chat-capable LLM backend.
///
/// Implementations send a system prompt and a user prompt in whatever wire
/// shape the backend expects (messages array or separate system/prompt
/// fields) and surface the response text. Calls block until response or
/// timeout; there is no retry and no mid-call cancellation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Send one system+user exchange and return the raw response.
    ///
    /// Fails with [`crate::Error::BackendUnavailable`] when the backend is
    /// unreachable or misconfigured, and with
    /// [`crate::Error::InvalidResponseShape`] when a success response lacks
    /// the expected content field.
    async fn send_chat(&self, system: &str, user: &str) -> Result<ChatOutcome>;

    /// Name of the generation model handling requests.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_outcome_holds_usage() {
        let outcome = ChatOutcome {
            text: "{}".to_string(),
            usage: UsageMetrics {
                prompt_tokens: 12,
                completion_tokens: 3,
                total_tokens: 15,
            },
        };
        assert_eq!(outcome.usage.total_tokens, 15);
    }

    #[test]
    fn test_backend_trait_is_object_safe() {
        fn assert_object_safe(_: &dyn ChatBackend) {}
        let _ = assert_object_safe;
    }
}
