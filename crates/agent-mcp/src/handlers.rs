//! Protocol Method Handlers
//!
//! Routes each request envelope to the catalogs, the tool dispatcher, or the
//! orchestrator. Application errors (unknown tool, bad arguments, unknown
//! resource) are returned inside successful envelopes as error-flagged
//! content; transport errors are reserved for malformed envelopes and
//! unknown methods.

use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use agent_core::{thread::ThreadId, tool::ToolCall, Message};

use crate::rpc::{Request, Response, RpcError, JSONRPC_VERSION};
use crate::state::AppState;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatParams {
    message: String,
    #[serde(default, alias = "thread_id")]
    thread_id: Option<String>,
}

/// Dispatch one request envelope; notifications get no response
pub async fn dispatch(state: &AppState, request: Request) -> Option<Response> {
    if request.is_notification() {
        tracing::debug!(method = %request.method, "Ignoring notification");
        return None;
    }

    let id = request.id.clone().unwrap_or(Value::Null);

    if request.jsonrpc != JSONRPC_VERSION {
        return Some(Response::error(
            id,
            RpcError::invalid_request(format!("unsupported jsonrpc version '{}'", request.jsonrpc)),
        ));
    }
    tracing::debug!(method = %request.method, "Handling request");

    let result = match request.method.as_str() {
        "initialize" => handle_initialize(),
        "ping" => Ok(json!({})),
        "tools/list" => handle_list_tools(state),
        "tools/call" => handle_call_tool(state, request.params).await,
        "resources/list" => handle_list_resources(state),
        "resources/read" => handle_read_resource(state, request.params).await,
        "chat" => handle_chat(state, request.params).await,
        other => Err(RpcError::method_not_found(other)),
    };

    Some(match result {
        Ok(value) => Response::success(id, value),
        Err(error) => Response::error(id, error),
    })
}

fn handle_initialize() -> Result<Value, RpcError> {
    Ok(json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": {},
            "resources": {},
        },
        "serverInfo": {
            "name": "mcp-agent",
            "version": env!("CARGO_PKG_VERSION"),
        },
    }))
}

/// Full registry snapshot
fn handle_list_tools(state: &AppState) -> Result<Value, RpcError> {
    let tools: Vec<Value> = state
        .tools
        .schemas()
        .into_iter()
        .map(|schema| {
            json!({
                "name": schema.name,
                "description": schema.description,
                "inputSchema": schema.input_schema(),
            })
        })
        .collect();

    Ok(json!({ "tools": tools }))
}

/// Single ad-hoc tool call, not tied to a thread
async fn handle_call_tool(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let params: CallToolParams =
        serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e))?;

    let call = ToolCall {
        id: uuid::Uuid::new_v4().to_string(),
        name: params.name,
        arguments: params.arguments,
    };

    let result = state.tools.dispatch(&call).await;

    Ok(json!({
        "content": [{ "type": "text", "text": result.output }],
        "isError": !result.success,
    }))
}

/// Catalog snapshot
fn handle_list_resources(state: &AppState) -> Result<Value, RpcError> {
    let resources = state.resources.specs();
    Ok(json!({ "resources": resources }))
}

/// Read a resource; an unknown URI is a reported failure, not a fault
async fn handle_read_resource(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let params: ReadResourceParams =
        serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e))?;

    match state.resources.read(&params.uri).await {
        Ok((spec, content)) => Ok(json!({
            "contents": [{
                "uri": spec.uri,
                "mimeType": spec.mime_type,
                "text": content,
            }],
        })),
        Err(e) => {
            tracing::debug!(uri = %params.uri, error = %e, "Resource read failed");
            Ok(json!({
                "contents": [{
                    "uri": params.uri,
                    "mimeType": "text/plain",
                    "text": e.user_message(),
                }],
                "isError": true,
            }))
        }
    }
}

/// Run one orchestrator turn against the thread's conversation
///
/// Turns on the same thread id serialize behind the thread's lock.
async fn handle_chat(state: &AppState, params: Value) -> Result<Value, RpcError> {
    let params: ChatParams = serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e))?;

    let thread_id = params
        .thread_id
        .map(ThreadId::from_string)
        .unwrap_or_default();

    let thread = state.threads.get_or_create(&thread_id);
    let mut thread = thread.lock().await;

    thread.conversation.push(Message::user(params.message));

    let agent = state.agent();
    let reply = match agent.run(&mut thread.conversation).await {
        Ok(answer) => json!({
            "message": answer,
            "threadId": thread_id.as_str(),
            "model": state.agent_config.generation.model,
        }),
        Err(e) => {
            tracing::error!(thread = %thread_id, error = %e, "Agent turn failed");
            json!({
                "message": e.user_message(),
                "threadId": thread_id.as_str(),
                "model": state.agent_config.generation.model,
                "isError": true,
            })
        }
    };

    thread.touch();
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use agent_core::{
        orchestrator::AgentConfig,
        provider::GenerationOptions,
        tool::{AddNumbersTool, AgentHelpTool, MultiplyNumbersTool, ToolRegistry},
        ResourceCatalog, ThreadStore,
    };
    use agent_runtime::FallbackProvider;

    use crate::resources::{CapabilitiesResource, ConfigResource};
    use crate::state::RuntimeStatus;
    use crate::tools::SystemInfoTool;

    fn test_state() -> AppState {
        let status = Arc::new(RuntimeStatus {
            provider: "ollama".into(),
            ollama_model: "llama2".into(),
            gemini_model: "gemini-pro".into(),
            llm_connected: false,
        });

        let mut tools = ToolRegistry::new();
        tools.register(AddNumbersTool);
        tools.register(MultiplyNumbersTool);
        tools.register(AgentHelpTool);
        tools.register(SystemInfoTool::new(status.clone()));

        let tool_names: Vec<String> = tools.names().iter().map(|s| s.to_string()).collect();

        let mut resources = ResourceCatalog::new();
        resources.register(ConfigResource::new(status.clone(), tool_names));
        resources.register(CapabilitiesResource);

        AppState {
            provider: Arc::new(FallbackProvider::new()),
            tools: Arc::new(tools),
            resources: Arc::new(resources),
            threads: Arc::new(ThreadStore::new()),
            agent_config: AgentConfig {
                generation: GenerationOptions {
                    model: "llama2".into(),
                    ..Default::default()
                },
                ..Default::default()
            },
        }
    }

    fn request(method: &str, params: Value) -> Request {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        }))
        .unwrap()
    }

    async fn call(state: &AppState, method: &str, params: Value) -> Value {
        let response = dispatch(state, request(method, params)).await.unwrap();
        let encoded = serde_json::to_value(&response).unwrap();
        assert!(
            encoded.get("error").is_none(),
            "expected success envelope, got {}",
            encoded
        );
        encoded["result"].clone()
    }

    #[tokio::test]
    async fn test_list_tools_returns_exactly_four_specs() {
        let state = test_state();
        let result = call(&state, "tools/list", json!({})).await;

        let tools = result["tools"].as_array().unwrap();
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec![
                "add_numbers",
                "get_agent_help",
                "get_system_info",
                "multiply_numbers"
            ]
        );

        let add = &tools[0];
        assert_eq!(add["inputSchema"]["required"], json!(["a", "b"]));
        let multiply = &tools[3];
        assert_eq!(multiply["inputSchema"]["required"], json!(["x", "y"]));
        let help = &tools[1];
        assert_eq!(help["inputSchema"]["required"], json!([]));
    }

    #[tokio::test]
    async fn test_call_tool_add_numbers() {
        let state = test_state();
        let result = call(
            &state,
            "tools/call",
            json!({"name": "add_numbers", "arguments": {"a": 15, "b": 27}}),
        )
        .await;

        assert_eq!(result["isError"], json!(false));
        assert_eq!(result["content"][0]["text"], "42");
    }

    #[tokio::test]
    async fn test_call_tool_missing_argument_is_flagged_not_faulted() {
        let state = test_state();
        let result = call(
            &state,
            "tools/call",
            json!({"name": "add_numbers", "arguments": {"a": 5}}),
        )
        .await;

        assert_eq!(result["isError"], json!(true));
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains('b'));
    }

    #[tokio::test]
    async fn test_call_unknown_tool() {
        let state = test_state();
        let result = call(
            &state,
            "tools/call",
            json!({"name": "nonexistent_tool", "arguments": {}}),
        )
        .await;

        assert_eq!(result["isError"], json!(true));
        assert!(result["content"][0]["text"]
            .as_str()
            .unwrap()
            .contains("nonexistent_tool"));
    }

    #[tokio::test]
    async fn test_list_resources() {
        let state = test_state();
        let result = call(&state, "resources/list", json!({})).await;

        let resources = result["resources"].as_array().unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0]["uri"], "agent://capabilities");
        assert_eq!(resources[1]["uri"], "agent://config");
        assert_eq!(resources[1]["mimeType"], "application/json");
    }

    #[tokio::test]
    async fn test_read_config_resource_is_parseable() {
        let state = test_state();
        let result = call(&state, "resources/read", json!({"uri": "agent://config"})).await;

        let text = result["contents"][0]["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed["provider"], "ollama");
        assert_eq!(parsed["llm_connected"], false);
    }

    #[tokio::test]
    async fn test_read_unknown_resource_is_reported() {
        let state = test_state();
        let result = call(&state, "resources/read", json!({"uri": "agent://unknown"})).await;

        assert_eq!(result["isError"], json!(true));
        assert!(result["contents"][0]["text"]
            .as_str()
            .unwrap()
            .contains("agent://unknown"));
    }

    #[tokio::test]
    async fn test_chat_runs_full_turn_against_thread() {
        let state = test_state();
        let result = call(
            &state,
            "chat",
            json!({"message": "Add 15 and 27", "threadId": "main-conversation"}),
        )
        .await;

        assert!(result["message"].as_str().unwrap().contains("42"));
        assert_eq!(result["threadId"], "main-conversation");

        // user, assistant-with-call, tool, final assistant
        let thread = state
            .threads
            .get(&ThreadId::from_string("main-conversation"))
            .unwrap();
        assert_eq!(thread.lock().await.message_count(), 4);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let state = test_state();
        let response = dispatch(&state, request("bogus/method", json!({})))
            .await
            .unwrap();
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["error"]["code"], json!(RpcError::METHOD_NOT_FOUND));
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let state = test_state();
        let notification: Request = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "notifications/initialized",
        }))
        .unwrap();

        assert!(dispatch(&state, notification).await.is_none());
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version_is_rejected() {
        let state = test_state();
        let bad: Request = serde_json::from_value(json!({
            "jsonrpc": "1.0",
            "id": 1,
            "method": "tools/list",
        }))
        .unwrap();

        let response = dispatch(&state, bad).await.unwrap();
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["error"]["code"], json!(RpcError::INVALID_REQUEST));
    }

    #[tokio::test]
    async fn test_invalid_params_is_a_transport_error() {
        let state = test_state();
        let response = dispatch(&state, request("tools/call", json!({"arguments": {}})))
            .await
            .unwrap();
        let encoded = serde_json::to_value(&response).unwrap();
        assert_eq!(encoded["error"]["code"], json!(RpcError::INVALID_PARAMS));
    }
}
