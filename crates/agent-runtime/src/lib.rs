//! # agent-runtime
//!
//! Runtime providers for the mcp-agent system.
//!
//! ## Providers
//!
//! - **Ollama** (default): local LLM inference via Ollama
//! - **Gemini**: Google Generative Language API
//! - **Fallback**: deterministic keyword responder, selected when the
//!   configured remote backend fails its startup probe
//!
//! ## Usage
//!
//! ```rust,ignore
//! use agent_runtime::{config::LlmConfig, probe::select_provider};
//!
//! let config = LlmConfig::from_env()?;
//! let active = select_provider(&config).await;
//! let agent = AgentBuilder::new()
//!     .provider(active.provider.clone())
//!     .build()?;
//! ```

pub mod config;
pub mod fallback;
pub mod probe;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "ollama")]
pub mod ollama;

pub use config::{LlmConfig, ProviderKind};
pub use fallback::FallbackProvider;
pub use probe::{select_provider, ActiveProvider};

#[cfg(feature = "gemini")]
pub use gemini::GeminiProvider;

#[cfg(feature = "ollama")]
pub use ollama::OllamaProvider;

// Re-export core types for convenience
pub use agent_core::{
    Agent, AgentError, LlmProvider, Message, Result, Role, Tool, ToolRegistry,
};
