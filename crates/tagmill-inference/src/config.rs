//! Inference configuration system.
//!
//! Selects and configures the chat backend used for document analysis.
//! Configuration can be loaded from:
//! - TOML files (default: tagmill.toml in the working directory, or the
//!   path named by TAGMILL_CONFIG)
//! - Environment variables (TAGMILL_* prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use tagmill_inference::config::InferenceConfig;
//!
//! // Load from the default path or fall back to env vars
//! let config = InferenceConfig::load().expect("Failed to load config");
//!
//! // Or explicitly from a file
//! let config = InferenceConfig::from_file(std::path::Path::new("tagmill.toml")).expect("Failed to load");
//!
//! // Or from environment variables
//! let config = InferenceConfig::from_env();
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};

use crate::azure::AzureConfig;
use crate::ollama::{OllamaConfig, SamplingOptions};
use crate::openai::OpenAIConfig;
use crate::provider::ChatProvider;
use tagmill_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid provider: {0}")]
    InvalidProvider(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Missing configuration for selected provider: {0}")]
    MissingProvider(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn validate_url(label: &str, url: &str) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} base URL cannot be empty",
            label
        )));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{} base URL must start with http:// or https://, got: {}",
            label, url
        )));
    }
    Ok(())
}

/// Main inference configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Provider to use.
    pub provider: ChatProvider,
    /// Ollama configuration (if enabled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ollama: Option<OllamaConfig>,
    /// OpenAI configuration (if enabled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<OpenAIConfig>,
    /// Azure OpenAI configuration (if enabled).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub azure: Option<AzureConfig>,
    /// Custom OpenAI-compatible endpoint (if enabled).
    ///
    /// Shares the OpenAI wire shape; only the base URL and credentials
    /// differ, so the config struct is reused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<OpenAIConfig>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            provider: ChatProvider::Ollama,
            ollama: Some(OllamaConfig::default()),
            openai: None,
            azure: None,
            custom: None,
        }
    }
}

impl InferenceConfig {
    /// Get the default config file path.
    ///
    /// Honors TAGMILL_CONFIG when set, otherwise tagmill.toml in the
    /// working directory.
    pub fn default_config_path() -> PathBuf {
        env::var("TAGMILL_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("tagmill.toml"))
    }

    /// Load configuration from the default path, falling back to environment
    /// variables when the file does not exist.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading inference config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            Ok(Self::from_env())
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &std::path::Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let content = Self::substitute_env_vars(&content);

        #[derive(Deserialize)]
        struct TomlRoot {
            inference: TomlInferenceConfig,
        }

        #[derive(Deserialize)]
        struct TomlInferenceConfig {
            provider: String,
            #[serde(default)]
            ollama: Option<OllamaConfig>,
            #[serde(default)]
            openai: Option<OpenAIConfig>,
            #[serde(default)]
            azure: Option<AzureConfig>,
            #[serde(default)]
            custom: Option<OpenAIConfig>,
        }

        let root: TomlRoot = toml::from_str(&content)?;

        let provider = root.inference.provider.parse()?;

        let config = Self {
            provider,
            ollama: root.inference.ollama,
            openai: root.inference.openai,
            azure: root.inference.azure,
            custom: root.inference.custom,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// Only the section for the selected provider is populated, so that
    /// `validate()` catches a provider selected without its settings.
    pub fn from_env() -> Self {
        let provider = env::var("TAGMILL_PROVIDER")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(ChatProvider::Ollama);

        let mut config = Self {
            provider,
            ollama: None,
            openai: None,
            azure: None,
            custom: None,
        };

        match provider {
            ChatProvider::Ollama => {
                config.ollama = Some(OllamaConfig {
                    base_url: env::var("TAGMILL_OLLAMA_URL")
                        .unwrap_or_else(|_| defaults::OLLAMA_URL.to_string()),
                    model: env::var("TAGMILL_OLLAMA_MODEL")
                        .unwrap_or_else(|_| defaults::OLLAMA_GEN_MODEL.to_string()),
                    sampling: SamplingOptions::default(),
                    num_predict: defaults::RESERVED_RESPONSE_TOKENS as u32,
                    timeout_seconds: defaults::OLLAMA_TIMEOUT_SECS,
                });
            }
            ChatProvider::OpenAI => {
                config.openai = Some(OpenAIConfig {
                    base_url: env::var("TAGMILL_OPENAI_URL")
                        .unwrap_or_else(|_| defaults::OPENAI_URL.to_string()),
                    api_key: env::var("TAGMILL_OPENAI_API_KEY").ok(),
                    model: env::var("TAGMILL_OPENAI_MODEL")
                        .unwrap_or_else(|_| defaults::OPENAI_GEN_MODEL.to_string()),
                    ..Default::default()
                });
            }
            ChatProvider::Azure => {
                config.azure = Some(AzureConfig {
                    endpoint: env::var("TAGMILL_AZURE_ENDPOINT").unwrap_or_default(),
                    api_key: env::var("TAGMILL_AZURE_API_KEY").unwrap_or_default(),
                    deployment: env::var("TAGMILL_AZURE_DEPLOYMENT").unwrap_or_default(),
                    api_version: env::var("TAGMILL_AZURE_API_VERSION")
                        .unwrap_or_else(|_| defaults::AZURE_API_VERSION.to_string()),
                    ..Default::default()
                });
            }
            ChatProvider::Custom => {
                config.custom = Some(OpenAIConfig {
                    base_url: env::var("TAGMILL_CUSTOM_URL").unwrap_or_default(),
                    api_key: env::var("TAGMILL_CUSTOM_API_KEY").ok(),
                    model: env::var("TAGMILL_CUSTOM_MODEL").unwrap_or_default(),
                    ..Default::default()
                });
            }
        }

        config
    }

    /// Get the list of configured providers.
    pub fn available_providers(&self) -> Vec<ChatProvider> {
        let mut providers = Vec::new();
        if self.ollama.is_some() {
            providers.push(ChatProvider::Ollama);
        }
        if self.openai.is_some() {
            providers.push(ChatProvider::OpenAI);
        }
        if self.azure.is_some() {
            providers.push(ChatProvider::Azure);
        }
        if self.custom.is_some() {
            providers.push(ChatProvider::Custom);
        }
        providers
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        // The selected provider must have its section present
        let present = match self.provider {
            ChatProvider::Ollama => self.ollama.is_some(),
            ChatProvider::OpenAI => self.openai.is_some(),
            ChatProvider::Azure => self.azure.is_some(),
            ChatProvider::Custom => self.custom.is_some(),
        };
        if !present {
            return Err(ConfigError::MissingProvider(format!(
                "{} is selected but not configured",
                self.provider
            )));
        }

        if let Some(ref ollama) = self.ollama {
            validate_url("Ollama", &ollama.base_url)?;
            if ollama.model.is_empty() {
                return Err(ConfigError::Validation(
                    "Ollama model cannot be empty".to_string(),
                ));
            }
        }

        if let Some(ref openai) = self.openai {
            validate_url("OpenAI", &openai.base_url)?;
            if openai.model.is_empty() {
                return Err(ConfigError::Validation(
                    "OpenAI model cannot be empty".to_string(),
                ));
            }
        }

        if let Some(ref azure) = self.azure {
            validate_url("Azure", &azure.endpoint)?;
            if azure.api_key.is_empty() {
                return Err(ConfigError::Validation(
                    "Azure api_key cannot be empty".to_string(),
                ));
            }
            if azure.deployment.is_empty() {
                return Err(ConfigError::Validation(
                    "Azure deployment cannot be empty".to_string(),
                ));
            }
        }

        if let Some(ref custom) = self.custom {
            validate_url("Custom", &custom.base_url)?;
            if custom.model.is_empty() {
                return Err(ConfigError::Validation(
                    "Custom model cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Substitute environment variables in the format ${VAR_NAME}.
    fn substitute_env_vars(content: &str) -> String {
        let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").unwrap();
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
    }
}
