//! Startup Provider Selection
//!
//! Builds the configured remote backend and probes it once at initialization.
//! If the probe fails the deterministic fallback responder is selected
//! instead; the choice is not re-evaluated per call.

use std::sync::Arc;

use agent_core::{
    error::{AgentError, Result},
    provider::LlmProvider,
};

use crate::config::LlmConfig;
use crate::fallback::FallbackProvider;

/// The provider selected at startup
pub struct ActiveProvider {
    pub provider: Arc<dyn LlmProvider>,

    /// Whether the configured remote backend answered the startup probe
    pub connected: bool,
}

/// Build the configured remote variant, probe it, and fall back if needed
pub async fn select_provider(config: &LlmConfig) -> ActiveProvider {
    let remote = match build_remote(config) {
        Ok(remote) => remote,
        Err(e) => {
            tracing::warn!(error = %e, "LLM initialization failed - using fallback responder");
            return fallback();
        }
    };

    match remote.health_check().await {
        Ok(true) => {
            tracing::info!(provider = %config.provider, "Connected to LLM provider");
            ActiveProvider {
                provider: remote,
                connected: true,
            }
        }
        Ok(false) => {
            tracing::warn!(
                provider = %config.provider,
                "LLM provider not reachable - using fallback responder"
            );
            fallback()
        }
        Err(e) => {
            tracing::warn!(
                provider = %config.provider,
                error = %e,
                "LLM probe failed - using fallback responder"
            );
            fallback()
        }
    }
}

fn fallback() -> ActiveProvider {
    ActiveProvider {
        provider: Arc::new(FallbackProvider::new()),
        connected: false,
    }
}

fn build_remote(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.provider {
        #[cfg(feature = "ollama")]
        crate::config::ProviderKind::Ollama => Ok(Arc::new(crate::ollama::OllamaProvider::new(
            &config.ollama_base_url,
        ))),

        #[cfg(feature = "gemini")]
        crate::config::ProviderKind::Gemini => {
            let api_key = config.google_api_key.as_ref().ok_or_else(|| {
                AgentError::Config("Google API key is required for Gemini provider".into())
            })?;
            Ok(Arc::new(crate::gemini::GeminiProvider::new(api_key)))
        }

        #[allow(unreachable_patterns)]
        other => Err(AgentError::Config(format!(
            "provider '{}' not compiled into this build",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    #[tokio::test]
    async fn test_unreachable_remote_selects_fallback() {
        let config = LlmConfig {
            // Nothing listens here; the probe must fail fast and fall back.
            ollama_base_url: "http://127.0.0.1:9".into(),
            ..Default::default()
        };

        let active = select_provider(&config).await;
        assert!(!active.connected);
        assert!(active.provider.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_gemini_without_key_selects_fallback() {
        let config = LlmConfig {
            provider: ProviderKind::Gemini,
            google_api_key: None,
            ..Default::default()
        };

        let active = select_provider(&config).await;
        assert!(!active.connected);
    }
}
