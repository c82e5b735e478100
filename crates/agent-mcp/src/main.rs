//! mcp-agent MCP Server
//!
//! Stdio server speaking newline-delimited JSON-RPC 2.0. One envelope is
//! processed to completion before the next is read; stdout carries protocol
//! traffic, so all logging goes to stderr.

mod handlers;
mod resources;
mod rpc;
mod state;
mod tools;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use agent_core::{
    orchestrator::AgentConfig,
    provider::GenerationOptions,
    tool::{AddNumbersTool, AgentHelpTool, MultiplyNumbersTool, ToolRegistry},
    ResourceCatalog, ThreadStore,
};
use agent_runtime::{config::LlmConfig, probe::select_provider};

use crate::resources::{CapabilitiesResource, ConfigResource};
use crate::rpc::{Request, Response, RpcError};
use crate::state::{AppState, RuntimeStatus};
use crate::tools::SystemInfoTool;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Stdout is the protocol channel; log to stderr only.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    let config = LlmConfig::from_env()?;
    tracing::info!(provider = %config.provider, "Configured LLM provider");

    // Probe the remote backend once; fall back to the deterministic responder
    let active = select_provider(&config).await;
    if active.connected {
        if let Ok(models) = active.provider.list_models().await {
            for model in models {
                tracing::info!("  Model: {}", model.id);
            }
        }
    }

    let status = Arc::new(RuntimeStatus {
        provider: config.provider.to_string(),
        ollama_model: config.ollama_model.clone(),
        gemini_model: config.gemini_model.clone(),
        llm_connected: active.connected,
    });

    // Static registration table, consulted read-only from here on
    let mut tools = ToolRegistry::new();
    tools.register(AddNumbersTool);
    tools.register(MultiplyNumbersTool);
    tools.register(AgentHelpTool);
    tools.register(SystemInfoTool::new(status.clone()));

    tracing::info!("Registered {} tools:", tools.len());
    for name in tools.names() {
        tracing::info!("  • {}", name);
    }

    let tool_names: Vec<String> = tools.names().iter().map(|s| s.to_string()).collect();

    let mut catalog = ResourceCatalog::new();
    catalog.register(ConfigResource::new(status.clone(), tool_names));
    catalog.register(CapabilitiesResource);

    let agent_config = AgentConfig {
        generation: GenerationOptions {
            model: config.default_model().into(),
            ..Default::default()
        },
        ..Default::default()
    };

    let state = AppState {
        provider: active.provider,
        tools: Arc::new(tools),
        resources: Arc::new(catalog),
        threads: Arc::new(ThreadStore::new()),
        agent_config,
    };

    tracing::info!("mcp-agent server ready on stdio");
    serve(state).await
}

/// Read envelopes from stdin one line at a time, each processed to
/// completion before the next is accepted
async fn serve(state: AppState) -> anyhow::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => handlers::dispatch(&state, request).await,
            Err(e) => {
                tracing::warn!(error = %e, "Malformed request envelope");
                Some(Response::error(
                    serde_json::Value::Null,
                    RpcError::parse_error(e),
                ))
            }
        };

        if let Some(response) = response {
            let mut payload = serde_json::to_vec(&response)?;
            payload.push(b'\n');
            stdout.write_all(&payload).await?;
            stdout.flush().await?;
        }
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
