//! OpenAI-compatible chat backend.
//!
//! Covers the hosted OpenAI API and any endpoint speaking the same
//! `/chat/completions` protocol (LocalAI, LiteLLM, vLLM, and the generic
//! custom-endpoint provider variant).

mod backend;
pub(crate) mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
