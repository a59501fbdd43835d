//! Chat provider selection.
//!
//! Maps the configured provider to a concrete [`ChatBackend`]. The backend
//! lives on the caller's stack/heap for the duration of the analysis run,
//! with no shared mutable state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ConfigError, InferenceConfig};
use crate::{AzureBackend, OllamaBackend, OpenAIBackend};
use tagmill_core::{ChatBackend, Error, Result};

/// Chat provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    #[default]
    Ollama,
    OpenAI,
    Azure,
    /// Any OpenAI-compatible endpoint with a caller-supplied base URL.
    Custom,
}

impl FromStr for ChatProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" => Ok(Self::OpenAI),
            "azure" => Ok(Self::Azure),
            "custom" => Ok(Self::Custom),
            _ => Err(ConfigError::InvalidProvider(s.to_string())),
        }
    }
}

impl fmt::Display for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ollama => write!(f, "ollama"),
            Self::OpenAI => write!(f, "openai"),
            Self::Azure => write!(f, "azure"),
            Self::Custom => write!(f, "custom"),
        }
    }
}

/// Build the chat backend selected by the configuration.
///
/// Fails with [`Error::BackendUnavailable`] when the selected provider has
/// no configuration section, the same error the backend constructors return
/// for unusable settings.
pub fn build_backend(config: &InferenceConfig) -> Result<Box<dyn ChatBackend>> {
    let backend: Box<dyn ChatBackend> = match config.provider {
        ChatProvider::Ollama => {
            let ollama = config.ollama.clone().ok_or_else(|| {
                Error::BackendUnavailable("Ollama provider is not configured".to_string())
            })?;
            Box::new(OllamaBackend::new(ollama)?)
        }
        ChatProvider::OpenAI => {
            let openai = config.openai.clone().ok_or_else(|| {
                Error::BackendUnavailable("OpenAI provider is not configured".to_string())
            })?;
            Box::new(OpenAIBackend::new(openai)?)
        }
        ChatProvider::Azure => {
            let azure = config.azure.clone().ok_or_else(|| {
                Error::BackendUnavailable("Azure provider is not configured".to_string())
            })?;
            Box::new(AzureBackend::new(azure)?)
        }
        ChatProvider::Custom => {
            let custom = config.custom.clone().ok_or_else(|| {
                Error::BackendUnavailable("Custom provider is not configured".to_string())
            })?;
            Box::new(OpenAIBackend::new(custom)?)
        }
    };

    info!(
        subsystem = "inference",
        provider = %config.provider,
        model = backend.model_name(),
        "Chat backend ready"
    );

    Ok(backend)
}
