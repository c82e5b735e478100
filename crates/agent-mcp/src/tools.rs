//! Server-Side Tools
//!
//! Tools that report on the running server rather than pure computation.

use std::sync::Arc;

use agent_core::{
    error::Result,
    tool::{Tool, ToolCall, ToolResult, ToolSchema},
};
use async_trait::async_trait;

use crate::state::RuntimeStatus;

/// Reports the server's configuration and connection status
pub struct SystemInfoTool {
    status: Arc<RuntimeStatus>,
}

impl SystemInfoTool {
    pub fn new(status: Arc<RuntimeStatus>) -> Self {
        Self { status }
    }
}

#[async_trait]
impl Tool for SystemInfoTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_system_info".into(),
            description: "Get information about the MCP server and agent system".into(),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        let status = &self.status;
        let connection = if status.llm_connected {
            "Connected"
        } else {
            "Not Connected"
        };

        let report = format!(
            "Agent System Information:\n\
             \n\
             Configuration:\n\
             - LLM Provider: {}\n\
             - Ollama Model: {}\n\
             - Gemini Model: {}\n\
             - LLM Status: {}\n\
             \n\
             Available Tools:\n\
             - Mathematical operations (add, multiply)\n\
             - System information and help\n\
             \n\
             MCP Integration:\n\
             - Server Status: Active\n\
             - Protocol: Model Context Protocol",
            status.provider, status.ollama_model, status.gemini_model, connection
        );

        Ok(ToolResult::success("get_system_info", report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_system_info_reports_status() {
        let tool = SystemInfoTool::new(Arc::new(RuntimeStatus {
            provider: "ollama".into(),
            ollama_model: "llama2".into(),
            gemini_model: "gemini-pro".into(),
            llm_connected: false,
        }));

        let result = tool.execute(&ToolCall::new("get_system_info")).await.unwrap();
        assert!(result.success);
        assert!(result.output.contains("LLM Provider: ollama"));
        assert!(result.output.contains("Not Connected"));
    }
}
