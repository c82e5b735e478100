//! Application State

use std::sync::Arc;

use agent_core::{
    orchestrator::AgentConfig, Agent, LlmProvider, ResourceCatalog, ThreadStore, ToolRegistry,
};

/// Runtime status snapshot, reported by `get_system_info` and `agent://config`
#[derive(Clone, Debug)]
pub struct RuntimeStatus {
    /// Configured provider name ("ollama" or "gemini")
    pub provider: String,

    /// Ollama model identifier
    pub ollama_model: String,

    /// Gemini model identifier
    pub gemini_model: String,

    /// Whether the remote backend answered the startup probe
    pub llm_connected: bool,
}

/// Shared application state
///
/// Constructed once at startup and passed into every request-handling call.
/// The registry and catalog are immutable after initialization.
#[derive(Clone)]
pub struct AppState {
    /// Selected LLM provider (remote or fallback)
    pub provider: Arc<dyn LlmProvider>,

    /// Tool registry with all available tools
    pub tools: Arc<ToolRegistry>,

    /// Resource catalog
    pub resources: Arc<ResourceCatalog>,

    /// Per-thread conversation store
    pub threads: Arc<ThreadStore>,

    /// Orchestrator configuration shared by all turns
    pub agent_config: AgentConfig,
}

impl AppState {
    /// Build an orchestrator over the shared provider and registry
    pub fn agent(&self) -> Agent {
        Agent::new(
            self.provider.clone(),
            self.tools.clone(),
            self.agent_config.clone(),
        )
    }
}
