//! # tagmill-inference
//!
//! Chat backend adapters for tagmill.
//!
//! One trait ([`tagmill_core::ChatBackend`]), several wire shapes:
//!
//! - [`OpenAIBackend`] — OpenAI-compatible chat completions (also serves
//!   generic custom endpoints with an arbitrary base URL)
//! - [`AzureBackend`] — Azure OpenAI deployment-scoped chat completions
//! - [`OllamaBackend`] — Ollama generate endpoint with JSON format
//!   enforcement and explicit sampling options
//! - [`MockBackend`] — deterministic scripted backend for tests
//!
//! Backends are selected through [`config::InferenceConfig`] and built with
//! [`provider::build_backend`]. Prompt assembly lives in `tagmill-analysis`;
//! this crate only moves assembled prompts over the wire.

pub mod config;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod provider;

mod azure;

pub use azure::{AzureBackend, AzureConfig};
pub use config::InferenceConfig;
pub use mock::MockBackend;
pub use ollama::{OllamaBackend, OllamaConfig, SamplingOptions};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use provider::{build_backend, ChatProvider};
