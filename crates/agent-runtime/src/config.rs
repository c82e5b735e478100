//! LLM Configuration
//!
//! Environment-driven configuration for the model backends.

use agent_core::error::{AgentError, Result};
use serde::{Deserialize, Serialize};

/// Which remote backend is configured
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    Gemini,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Ollama => write!(f, "ollama"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = AgentError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(AgentError::Config(format!(
                "Unsupported LLM provider: {}",
                other
            ))),
        }
    }
}

/// Configuration for LLM connections
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Configured backend
    pub provider: ProviderKind,

    /// Ollama server base URL
    pub ollama_base_url: String,

    /// Ollama model identifier
    pub ollama_model: String,

    /// Google API key (required for the Gemini provider)
    #[serde(skip_serializing)]
    pub google_api_key: Option<String>,

    /// Gemini model identifier
    pub gemini_model: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Ollama,
            ollama_base_url: "http://localhost:11434".into(),
            ollama_model: "llama2".into(),
            google_api_key: None,
            gemini_model: "gemini-pro".into(),
        }
    }
}

impl LlmConfig {
    /// Load LLM configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let provider = match std::env::var("DEFAULT_LLM_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ProviderKind::Ollama,
        };

        Ok(Self {
            provider,
            ollama_base_url: std::env::var("OLLAMA_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:11434".into()),
            ollama_model: std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| "llama2".into()),
            google_api_key: std::env::var("GOOGLE_API_KEY").ok(),
            gemini_model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".into()),
        })
    }

    /// The model identifier for the configured backend
    pub fn default_model(&self) -> &str {
        match self.provider {
            ProviderKind::Ollama => &self.ollama_model,
            ProviderKind::Gemini => &self.gemini_model,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = LlmConfig::default();
        assert_eq!(config.provider, ProviderKind::Ollama);
        assert_eq!(config.ollama_base_url, "http://localhost:11434");
        assert_eq!(config.ollama_model, "llama2");
        assert_eq!(config.gemini_model, "gemini-pro");
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("ollama".parse::<ProviderKind>().unwrap(), ProviderKind::Ollama);
        assert_eq!("Gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("openai".parse::<ProviderKind>().is_err());
    }
}
