//! Centralized default constants for the tagmill system.
//!
//! **This module is the single source of truth** for all shared default values.
//! All crates should reference these constants instead of defining their own
//! magic numbers.
//!
//! Organized by domain area. When adding new constants, place them in the
//! appropriate section and document the rationale for the chosen value.

// =============================================================================
// TOKEN BUDGET
// =============================================================================

/// Default token ceiling for a single analysis call (prompt + response).
pub const TOKEN_LIMIT: usize = 128_000;

/// Tokens reserved for the model response out of the token ceiling.
pub const RESERVED_RESPONSE_TOKENS: usize = 1_000;

/// Token ceiling for caller-supplied external context appended to the prompt.
pub const EXTERNAL_CONTEXT_TOKEN_CEILING: usize = 500;

/// Character ceiling applied to document content before token budgeting.
/// Small-context models start ignoring instructions well before the nominal
/// token budget runs out, so content is capped even when tokens remain.
pub const CONTENT_CHAR_CEILING: usize = 32_000;

/// Characters per token for the heuristic estimator used when no exact
/// tokenizer is available for the target model.
pub const HEURISTIC_CHARS_PER_TOKEN: usize = 4;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama base URL.
pub const OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default OpenAI base URL.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default generation model for OpenAI-compatible backends.
pub const OPENAI_GEN_MODEL: &str = "gpt-4o-mini";

/// Default generation model for Ollama.
pub const OLLAMA_GEN_MODEL: &str = "llama3.1:8b";

/// Default Azure OpenAI API version query parameter.
pub const AZURE_API_VERSION: &str = "2024-08-01-preview";

/// Timeout for chat-completion requests in seconds.
pub const CHAT_TIMEOUT_SECS: u64 = 120;

/// Timeout for Ollama generate requests in seconds. Local models on modest
/// hardware routinely take minutes per document.
pub const OLLAMA_TIMEOUT_SECS: u64 = 1_800;

// =============================================================================
// OLLAMA SAMPLING
// =============================================================================

/// Default sampling temperature.
pub const OLLAMA_TEMPERATURE: f32 = 0.7;

/// Default nucleus sampling cutoff.
pub const OLLAMA_TOP_P: f32 = 0.9;

/// Default top-k sampling cutoff.
pub const OLLAMA_TOP_K: u32 = 7;

/// Default repetition penalty.
pub const OLLAMA_REPEAT_PENALTY: f32 = 1.1;

/// Floor for the computed context window passed to Ollama.
pub const OLLAMA_NUM_CTX_MIN: usize = 2_048;

// =============================================================================
// DOCUMENT API CLIENT
// =============================================================================

/// Page size for paginated listing endpoints (tags, correspondents, types).
pub const API_PAGE_SIZE: usize = 100;

/// Timeout for document API requests in seconds.
pub const API_TIMEOUT_SECS: u64 = 30;

/// Default directory for the on-disk thumbnail cache.
pub const THUMBNAIL_CACHE_DIR: &str = "cache/thumbnails";

// =============================================================================
// AUDIT
// =============================================================================

/// Default path for the append-only prompt/response audit log.
pub const AUDIT_LOG_PATH: &str = "logs/prompts.log";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_constants_are_consistent() {
        assert!(RESERVED_RESPONSE_TOKENS < TOKEN_LIMIT);
        assert!(EXTERNAL_CONTEXT_TOKEN_CEILING < TOKEN_LIMIT);
        assert!(HEURISTIC_CHARS_PER_TOKEN > 0);
    }

    #[test]
    fn test_default_urls_are_http() {
        assert!(OLLAMA_URL.starts_with("http://"));
        assert!(OPENAI_URL.starts_with("https://"));
    }

    #[test]
    fn test_ollama_timeout_is_long() {
        // Local models need a much longer leash than hosted APIs.
        assert!(OLLAMA_TIMEOUT_SECS > CHAT_TIMEOUT_SECS);
    }
}
