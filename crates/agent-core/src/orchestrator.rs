//! Orchestration Loop
//!
//! Drives one conversational turn as an explicit state machine per thread:
//! `AwaitingModel` invokes the provider with the full history and appends the
//! assistant message; `AwaitingTools` dispatches the requested tool calls and
//! appends their results in request order; `Done` carries the final answer.
//! The model/tool cycle is bounded by a configurable iteration ceiling.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AgentError, Result};
use crate::message::{Conversation, Message};
use crate::provider::{Completion, GenerationOptions, LlmProvider};
use crate::tool::{ToolCall, ToolRegistry};

/// Agent configuration
#[derive(Clone, Debug)]
pub struct AgentConfig {
    /// System prompt template
    pub system_prompt: String,

    /// Maximum model/tool cycles per turn before forcing completion
    pub max_iterations: usize,

    /// Generation options
    pub generation: GenerationOptions,

    /// Whether to append tool descriptions to the system prompt
    pub inject_tool_descriptions: bool,

    /// Deadline for a single model call; `None` waits indefinitely
    pub model_deadline: Option<Duration>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: DEFAULT_SYSTEM_PROMPT.into(),
            max_iterations: 25,
            generation: GenerationOptions::default(),
            inject_tool_descriptions: true,
            model_deadline: None,
        }
    }
}

const DEFAULT_SYSTEM_PROMPT: &str = r#"You are a helpful AI assistant.

When you need to use a tool, respond with a JSON block in this exact format:
```tool
{"tool": "tool_name", "arguments": {"arg1": "value1"}}
```

After receiving tool results, synthesize them into a helpful response.
If you can answer directly without tools, do so.
Be concise and accurate."#;

/// State of one orchestrator turn
#[derive(Debug)]
enum TurnState {
    /// Waiting on the provider for the next assistant message
    AwaitingModel,
    /// Assistant requested tool calls that have not yet been dispatched
    AwaitingTools(Vec<ToolCall>),
    /// Turn complete; the final answer
    Done(String),
}

/// The orchestrator: alternates between model invocation and tool execution
/// until the model produces an answer without tool calls
pub struct Agent {
    provider: Arc<dyn LlmProvider>,
    tools: Arc<ToolRegistry>,
    config: AgentConfig,
}

impl Agent {
    /// Create a new agent
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        config: AgentConfig,
    ) -> Self {
        Self {
            provider,
            tools,
            config,
        }
    }

    /// Create with default configuration
    pub fn with_defaults(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>) -> Self {
        Self::new(provider, tools, AgentConfig::default())
    }

    /// Build the full system prompt including tool descriptions
    fn build_system_prompt(&self) -> String {
        let mut prompt = self.config.system_prompt.clone();

        if self.config.inject_tool_descriptions && !self.tools.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.tools.generate_prompt_section());
        }

        prompt
    }

    /// The history sent to the provider
    ///
    /// The stored conversation is append-only, so the system prompt is
    /// prepended to the outbound copy rather than inserted into the thread.
    fn outbound_history(&self, conversation: &Conversation) -> Vec<Message> {
        if conversation.has_system_prompt() {
            conversation.messages().to_vec()
        } else {
            let mut history = Vec::with_capacity(conversation.len() + 1);
            history.push(Message::system(self.build_system_prompt()));
            history.extend_from_slice(conversation.messages());
            history
        }
    }

    /// Invoke the provider, honoring the configured deadline
    ///
    /// Nothing is appended to the conversation until this returns: a timed-out
    /// or cancelled call leaves the thread untouched.
    async fn invoke_model(&self, conversation: &Conversation) -> Result<Completion> {
        let history = self.outbound_history(conversation);
        let call = self.provider.complete(&history, &self.config.generation);

        match self.config.model_deadline {
            Some(deadline) => tokio::time::timeout(deadline, call).await.map_err(|_| {
                AgentError::Cancelled(format!("model call exceeded {:?} deadline", deadline))
            })?,
            None => call.await,
        }
    }

    /// Run one turn against a conversation that already ends with the user's
    /// message, returning the final answer
    pub async fn run(&self, conversation: &mut Conversation) -> Result<String> {
        let mut state = TurnState::AwaitingModel;
        let mut iterations = 0usize;
        // Call ids resolved so far this turn; a model reusing one is rejected.
        let mut resolved_ids = std::collections::HashSet::new();

        loop {
            state = match state {
                TurnState::AwaitingModel => {
                    iterations += 1;
                    if iterations > self.config.max_iterations {
                        let notice = format!(
                            "I could not finish this request within {} reasoning steps. \
                             Here is what I have so far; please try a simpler query.",
                            self.config.max_iterations
                        );
                        tracing::warn!(
                            max_iterations = self.config.max_iterations,
                            "Iteration limit reached, forcing turn completion"
                        );
                        conversation.push(Message::assistant(&notice));
                        TurnState::Done(notice)
                    } else {
                        let completion = self.invoke_model(conversation).await?;

                        let calls = if completion.tool_calls.is_empty() {
                            Self::extract_tool_calls(&completion.content)
                        } else {
                            completion.tool_calls.clone()
                        };

                        conversation.push(
                            Message::assistant_with_calls(&completion.content, calls.clone())
                                .with_model(&completion.model),
                        );

                        if calls.is_empty() {
                            TurnState::Done(completion.content)
                        } else {
                            TurnState::AwaitingTools(calls)
                        }
                    }
                }

                TurnState::AwaitingTools(calls) => {
                    let results = self.tools.dispatch_batch(&calls, &mut resolved_ids).await;

                    // One tool message per result, in request order
                    for result in results {
                        tracing::debug!(
                            tool = %result.name,
                            success = result.success,
                            "Tool call completed"
                        );
                        conversation.push(Message::tool(result.output, result.id));
                    }

                    TurnState::AwaitingModel
                }

                TurnState::Done(answer) => return Ok(answer),
            };
        }
    }

    /// Run with a simple string input (creates a temporary conversation)
    pub async fn ask(&self, question: &str) -> Result<String> {
        let mut conversation = Conversation::new();
        conversation.push(Message::user(question));
        self.run(&mut conversation).await
    }

    /// Extract every fenced tool block from a model response, in order
    ///
    /// Providers without native tool calling are instructed to request tools
    /// via ```` ```tool ```` blocks; calls missing an id get a generated one.
    fn extract_tool_calls(content: &str) -> Vec<ToolCall> {
        const FENCE_OPEN: &str = "```tool";
        const FENCE_CLOSE: &str = "```";

        let mut calls = Vec::new();
        let mut rest = content;

        while let Some(start) = rest.find(FENCE_OPEN) {
            let after = &rest[start + FENCE_OPEN.len()..];
            let Some(end) = after.find(FENCE_CLOSE) else {
                break;
            };

            let json_str = after[..end].trim();
            match serde_json::from_str::<ToolCall>(json_str) {
                Ok(mut call) => {
                    if call.id.is_empty() {
                        call.id = uuid::Uuid::new_v4().to_string();
                    }
                    calls.push(call);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring malformed tool block");
                }
            }

            rest = &after[end + FENCE_CLOSE.len()..];
        }

        if calls.is_empty() {
            if let Some(call) = Self::extract_inline_tool_call(content) {
                calls.push(call);
            }
        }

        calls
    }

    /// Fallback: a raw JSON object with a "tool" key, outside a fence
    fn extract_inline_tool_call(content: &str) -> Option<ToolCall> {
        if !content.contains(r#""tool""#) {
            return None;
        }

        let start = content.find('{')?;
        let end = content.rfind('}')?;
        if end <= start {
            return None;
        }

        let mut call = serde_json::from_str::<ToolCall>(&content[start..=end]).ok()?;
        if call.id.is_empty() {
            call.id = uuid::Uuid::new_v4().to_string();
        }
        Some(call)
    }

    /// Get the tool registry
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Get configuration
    pub fn config(&self) -> &AgentConfig {
        &self.config
    }
}

/// Builder for Agent configuration
pub struct AgentBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    tools: ToolRegistry,
    config: AgentConfig,
}

impl Default for AgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentBuilder {
    pub fn new() -> Self {
        Self {
            provider: None,
            tools: ToolRegistry::new(),
            config: AgentConfig::default(),
        }
    }

    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn tool<T: crate::tool::Tool + 'static>(mut self, tool: T) -> Self {
        self.tools.register(tool);
        self
    }

    pub fn tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.generation.model = model.into();
        self
    }

    pub fn temperature(mut self, temp: f32) -> Self {
        self.config.generation.temperature = temp;
        self
    }

    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    pub fn model_deadline(mut self, deadline: Duration) -> Self {
        self.config.model_deadline = Some(deadline);
        self
    }

    pub fn build(self) -> Result<Agent> {
        let provider = self
            .provider
            .ok_or_else(|| AgentError::Config("Provider is required".into()))?;

        Ok(Agent::new(provider, Arc::new(self.tools), self.config))
    }
}
