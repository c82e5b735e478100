//! Server Resources
//!
//! The two URI-addressed resources exposed to clients: the live configuration
//! snapshot and the capability description.

use std::sync::Arc;

use agent_core::{
    error::Result,
    resource::{Resource, ResourceSpec},
};
use async_trait::async_trait;

use crate::state::RuntimeStatus;

/// `agent://config` — current configuration and status as JSON
pub struct ConfigResource {
    status: Arc<RuntimeStatus>,
    tools_available: Vec<String>,
}

impl ConfigResource {
    pub fn new(status: Arc<RuntimeStatus>, tools_available: Vec<String>) -> Self {
        Self {
            status,
            tools_available,
        }
    }
}

#[async_trait]
impl Resource for ConfigResource {
    fn spec(&self) -> ResourceSpec {
        ResourceSpec {
            uri: "agent://config".into(),
            name: "Agent Configuration".into(),
            description: "Current agent configuration and status".into(),
            mime_type: "application/json".into(),
        }
    }

    async fn read(&self) -> Result<String> {
        let config = serde_json::json!({
            "provider": self.status.provider,
            "ollama_model": self.status.ollama_model,
            "gemini_model": self.status.gemini_model,
            "llm_connected": self.status.llm_connected,
            "tools_available": self.tools_available,
        });

        Ok(serde_json::to_string_pretty(&config)?)
    }
}

/// `agent://capabilities` — free-text capability description
pub struct CapabilitiesResource;

const CAPABILITIES_TEXT: &str = "\
Agent Capabilities:

Mathematical Operations:
- Addition of two integers
- Multiplication of two integers

System Operations:
- Configuration information
- Help and documentation
- Status monitoring

Future Capabilities:
- GitHub repository management
- Issue tracking and creation
- Pull request operations

MCP Integration:
- Full Model Context Protocol support
- Tool execution and resource access
- Real-time agent communication";

#[async_trait]
impl Resource for CapabilitiesResource {
    fn spec(&self) -> ResourceSpec {
        ResourceSpec {
            uri: "agent://capabilities".into(),
            name: "Agent Capabilities".into(),
            description: "Detailed information about agent capabilities".into(),
            mime_type: "text/plain".into(),
        }
    }

    async fn read(&self) -> Result<String> {
        Ok(CAPABILITIES_TEXT.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_config_resource_is_valid_json() {
        let resource = ConfigResource::new(
            Arc::new(RuntimeStatus {
                provider: "ollama".into(),
                ollama_model: "llama2".into(),
                gemini_model: "gemini-pro".into(),
                llm_connected: true,
            }),
            vec!["add_numbers".into(), "multiply_numbers".into()],
        );

        let content = resource.read().await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed["provider"], "ollama");
        assert_eq!(parsed["llm_connected"], true);
        assert_eq!(parsed["tools_available"][0], "add_numbers");
    }
}
