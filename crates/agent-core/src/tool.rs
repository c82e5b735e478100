//! Tool System
//!
//! Schema-described tools registered once at process start and invoked by the
//! reasoning loop or directly by the protocol layer. Dispatch validates
//! arguments against the declared schema before the handler runs, and every
//! failure is converted into an error-flagged result rather than a fault.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{AgentError, Result};

/// Tool call request from the LLM
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call ID correlating this request to its result within one turn
    #[serde(default)]
    pub id: String,

    /// Tool identifier
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments as key-value pairs
    #[serde(default)]
    pub arguments: HashMap<String, serde_json::Value>,
}

impl ToolCall {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            arguments: HashMap::new(),
        }
    }

    pub fn with_arg(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.insert(key.into(), value);
        self
    }
}

/// Result from tool execution
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolResult {
    /// Tool that was called
    pub name: String,

    /// Call ID from the request
    pub id: String,

    /// Whether execution succeeded
    pub success: bool,

    /// Output (result text or error)
    pub output: String,
}

impl ToolResult {
    pub fn success(name: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            success: true,
            output: output.into(),
        }
    }

    pub fn failure(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: String::new(),
            success: false,
            output: error.into(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }
}

/// Parameter definition for tool schema
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParameterSchema {
    /// Parameter name
    pub name: String,

    /// JSON Schema type (string, integer, number, boolean, object, array)
    #[serde(rename = "type")]
    pub param_type: String,

    /// Human-readable description
    pub description: String,

    /// Whether this parameter is required
    #[serde(default)]
    pub required: bool,
}

impl ParameterSchema {
    /// Whether a JSON value matches this parameter's declared type
    pub fn matches(&self, value: &serde_json::Value) -> bool {
        match self.param_type.as_str() {
            "integer" => value.is_i64() || value.is_u64(),
            "number" => value.is_number(),
            "string" => value.is_string(),
            "boolean" => value.is_boolean(),
            "array" => value.is_array(),
            "object" => value.is_object(),
            _ => true,
        }
    }
}

/// Tool definition schema (for LLM function calling and catalog listing)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Unique tool identifier
    pub name: String,

    /// Human-readable description (shown to LLM and clients)
    pub description: String,

    /// Parameter definitions
    pub parameters: Vec<ParameterSchema>,
}

impl ToolSchema {
    /// Render as a JSON Schema object (`type`/`properties`/`required`)
    pub fn input_schema(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            properties.insert(
                param.name.clone(),
                serde_json::json!({
                    "type": param.param_type,
                    "description": param.description,
                }),
            );
            if param.required {
                required.push(serde_json::Value::String(param.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }
}

/// Tool trait - implement to add new capabilities
#[async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool's schema
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with validated arguments
    async fn execute(&self, call: &ToolCall) -> Result<ToolResult>;

    /// Validate arguments against the schema before execution
    fn validate(&self, call: &ToolCall) -> Result<()> {
        let schema = self.schema();

        for param in &schema.parameters {
            match call.arguments.get(&param.name) {
                None if param.required => {
                    return Err(AgentError::ToolValidation(format!(
                        "missing required parameter: {}",
                        param.name
                    )));
                }
                Some(value) if !param.matches(value) => {
                    return Err(AgentError::ToolValidation(format!(
                        "parameter '{}' must be of type {}",
                        param.name, param.param_type
                    )));
                }
                _ => {}
            }
        }

        Ok(())
    }
}

/// Registry for available tools
///
/// Built once at process start and consulted read-only by both the reasoning
/// loop and the protocol catalog listing.
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Register a new tool
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let schema = tool.schema();
        self.tools.insert(schema.name.clone(), Arc::new(tool));
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Execute a single tool call end-to-end (lookup, validate, run)
    pub async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let tool = self
            .get(&call.name)
            .ok_or_else(|| AgentError::ToolNotFound(call.name.clone()))?;

        tool.validate(call)?;
        tool.execute(call).await
    }

    /// Execute a single call, converting every failure into an error-flagged
    /// result
    pub async fn dispatch(&self, call: &ToolCall) -> ToolResult {
        match self.execute(call).await {
            Ok(result) => result.with_id(call.id.clone()),
            Err(e) => {
                tracing::debug!(tool = %call.name, error = %e, "Tool call failed");
                ToolResult::failure(call.name.clone(), e.user_message()).with_id(call.id.clone())
            }
        }
    }

    /// Execute a batch of tool calls independently
    ///
    /// Returns one result per request, in request order, with matching ids.
    /// A failure in one call never blocks or discards the others. A call id
    /// duplicating one in `resolved_ids` is malformed model output and yields
    /// a failure result without running the handler; the set accumulates so a
    /// caller can carry it across batches of the same turn.
    pub async fn dispatch_batch(
        &self,
        calls: &[ToolCall],
        resolved_ids: &mut HashSet<String>,
    ) -> Vec<ToolResult> {
        let mut results = Vec::with_capacity(calls.len());

        for call in calls {
            if !call.id.is_empty() && !resolved_ids.insert(call.id.clone()) {
                results.push(
                    ToolResult::failure(
                        call.name.clone(),
                        format!("duplicate tool call id: {}", call.id),
                    )
                    .with_id(call.id.clone()),
                );
                continue;
            }
            results.push(self.dispatch(call).await);
        }

        results
    }

    /// Execute a standalone batch with no prior resolved ids
    pub async fn dispatch_all(&self, calls: &[ToolCall]) -> Vec<ToolResult> {
        self.dispatch_batch(calls, &mut HashSet::new()).await
    }

    /// Get all tool schemas (catalog snapshot)
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<_> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Get tool names
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Generate system prompt section describing available tools
    pub fn generate_prompt_section(&self) -> String {
        let mut prompt = String::from("## Available Tools\n\n");
        prompt.push_str("You can use the following tools by responding with a JSON block:\n\n");
        prompt.push_str("```tool\n{\"tool\": \"tool_name\", \"arguments\": {\"arg\": \"value\"}}\n```\n\n");

        for schema in self.schemas() {
            prompt.push_str(&format!("### {}\n", schema.name));
            prompt.push_str(&format!("{}\n", schema.description));

            if !schema.parameters.is_empty() {
                prompt.push_str("**Parameters:**\n");
                for param in &schema.parameters {
                    let required = if param.required { " (required)" } else { "" };
                    prompt.push_str(&format!(
                        "- `{}` ({}){}: {}\n",
                        param.name, param.param_type, required, param.description
                    ));
                }
            }
            prompt.push('\n');
        }

        prompt
    }
}

// ============================================================================
// Built-in Tools
// ============================================================================

/// Adds two integers
pub struct AddNumbersTool;

#[async_trait]
impl Tool for AddNumbersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "add_numbers".into(),
            description: "Add two numbers together".into(),
            parameters: vec![
                ParameterSchema {
                    name: "a".into(),
                    param_type: "integer".into(),
                    description: "First number to add".into(),
                    required: true,
                },
                ParameterSchema {
                    name: "b".into(),
                    param_type: "integer".into(),
                    description: "Second number to add".into(),
                    required: true,
                },
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let a = require_integer(call, "a")?;
        let b = require_integer(call, "b")?;

        match a.checked_add(b) {
            Some(sum) => {
                tracing::debug!(a, b, sum, "Adding numbers");
                Ok(ToolResult::success("add_numbers", sum.to_string()))
            }
            None => Ok(ToolResult::failure(
                "add_numbers",
                format!("integer overflow adding {} and {}", a, b),
            )),
        }
    }
}

/// Multiplies two integers
pub struct MultiplyNumbersTool;

#[async_trait]
impl Tool for MultiplyNumbersTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "multiply_numbers".into(),
            description: "Multiply two numbers together".into(),
            parameters: vec![
                ParameterSchema {
                    name: "x".into(),
                    param_type: "integer".into(),
                    description: "First number to multiply".into(),
                    required: true,
                },
                ParameterSchema {
                    name: "y".into(),
                    param_type: "integer".into(),
                    description: "Second number to multiply".into(),
                    required: true,
                },
            ],
        }
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolResult> {
        let x = require_integer(call, "x")?;
        let y = require_integer(call, "y")?;

        match x.checked_mul(y) {
            Some(product) => {
                tracing::debug!(x, y, product, "Multiplying numbers");
                Ok(ToolResult::success("multiply_numbers", product.to_string()))
            }
            None => Ok(ToolResult::failure(
                "multiply_numbers",
                format!("integer overflow multiplying {} and {}", x, y),
            )),
        }
    }
}

/// Describes the agent's capabilities
pub struct AgentHelpTool;

pub const AGENT_HELP_TEXT: &str = "\
I'm an autonomous agent with the following capabilities:

Mathematical Operations:
- Add two numbers: \"add 5 and 3\"
- Multiply two numbers: \"multiply 4 by 6\"

Future Capabilities (coming soon):
- GitHub repository management
- Issue tracking and creation
- Pull request operations

Just ask me to perform any of these operations!";

#[async_trait]
impl Tool for AgentHelpTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: "get_agent_help".into(),
            description: "Get information about the agent's capabilities".into(),
            parameters: Vec::new(),
        }
    }

    async fn execute(&self, _call: &ToolCall) -> Result<ToolResult> {
        Ok(ToolResult::success("get_agent_help", AGENT_HELP_TEXT))
    }
}

fn require_integer(call: &ToolCall, name: &str) -> Result<i64> {
    call.arguments
        .get(name)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| {
            AgentError::ToolValidation(format!("parameter '{}' must be an integer", name))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(AddNumbersTool);
        registry.register(MultiplyNumbersTool);
        registry.register(AgentHelpTool);
        registry
    }

    #[test]
    fn test_registry_lookup() {
        let registry = registry();
        assert_eq!(registry.len(), 3);
        assert!(registry.get("add_numbers").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn test_schema_rendering() {
        let schema = AddNumbersTool.schema();
        let json = schema.input_schema();
        assert_eq!(json["type"], "object");
        assert_eq!(json["properties"]["a"]["type"], "integer");
        assert_eq!(json["required"], json!(["a", "b"]));
    }

    #[tokio::test]
    async fn test_add_numbers() {
        let call = ToolCall::new("add_numbers")
            .with_arg("a", json!(15))
            .with_arg("b", json!(27));

        let result = registry().dispatch(&call).await;
        assert!(result.success);
        assert_eq!(result.output, "42");
        assert_eq!(result.id, call.id);
    }

    #[tokio::test]
    async fn test_multiply_numbers() {
        let call = ToolCall::new("multiply_numbers")
            .with_arg("x", json!(8))
            .with_arg("y", json!(9));

        let result = registry().dispatch(&call).await;
        assert!(result.success);
        assert_eq!(result.output, "72");
    }

    #[tokio::test]
    async fn test_missing_required_argument() {
        let call = ToolCall::new("add_numbers").with_arg("a", json!(5));

        let result = registry().dispatch(&call).await;
        assert!(!result.success);
        assert!(result.output.contains('b'));
    }

    #[tokio::test]
    async fn test_wrong_argument_type() {
        let call = ToolCall::new("add_numbers")
            .with_arg("a", json!("five"))
            .with_arg("b", json!(3));

        let result = registry().dispatch(&call).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let call = ToolCall::new("nonexistent_tool");

        let result = registry().dispatch(&call).await;
        assert!(!result.success);
        assert!(result.output.contains("nonexistent_tool"));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let calls = vec![
            ToolCall::new("add_numbers")
                .with_arg("a", json!(1))
                .with_arg("b", json!(2)),
            ToolCall::new("nonexistent_tool"),
            ToolCall::new("multiply_numbers")
                .with_arg("x", json!(3))
                .with_arg("y", json!(4)),
        ];

        let results = registry().dispatch_all(&calls).await;
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].output, "3");
        assert!(!results[1].success);
        assert_eq!(results[2].output, "12");
        for (call, result) in calls.iter().zip(&results) {
            assert_eq!(call.id, result.id);
        }
    }

    #[tokio::test]
    async fn test_duplicate_call_id_rejected() {
        let first = ToolCall::new("add_numbers")
            .with_arg("a", json!(1))
            .with_arg("b", json!(2));
        let mut second = ToolCall::new("add_numbers")
            .with_arg("a", json!(3))
            .with_arg("b", json!(4));
        second.id = first.id.clone();

        let results = registry().dispatch_all(&[first, second]).await;
        assert!(results[0].success);
        assert!(!results[1].success);
        assert!(results[1].output.contains("duplicate"));
    }
}
