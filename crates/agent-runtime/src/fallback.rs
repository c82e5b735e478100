//! Fallback Provider
//!
//! Deterministic, rule-based responder used when no remote backend is
//! reachable at startup. It recognizes literal keyword patterns in the last
//! message and emits structured tool calls for the arithmetic tools; it never
//! fails.

use agent_core::{
    error::Result,
    message::{Message, Role},
    provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo},
    tool::ToolCall,
};
use async_trait::async_trait;
use serde_json::json;

const MODEL_NAME: &str = "fallback";

const HELP_REPLY: &str =
    "I can help you with mathematical operations! Try asking me to add or multiply numbers.";

const GENERIC_REPLY: &str = "I can help you with adding and multiplying numbers. \
     Try saying 'add 5 and 3' or 'multiply 4 by 6'!";

/// Deterministic keyword-matching provider
#[derive(Default)]
pub struct FallbackProvider;

impl FallbackProvider {
    pub fn new() -> Self {
        Self
    }

    /// Decide the next assistant message from the last message in the history
    fn respond(last: Option<&Message>) -> Completion {
        let Some(last) = last else {
            return Completion::text(GENERIC_REPLY, MODEL_NAME);
        };

        // A tool already ran; restate its result as the answer.
        if last.role == Role::Tool {
            return Completion::text(
                format!("The result is {}.", last.content.trim()),
                MODEL_NAME,
            );
        }

        let text = last.content.to_lowercase();
        let numbers = extract_numbers(&text);

        if text.contains("help") || text.contains("what") {
            return Completion::text(HELP_REPLY, MODEL_NAME);
        }

        if text.contains("add") && numbers.len() >= 2 {
            let call = ToolCall::new("add_numbers")
                .with_arg("a", json!(numbers[0]))
                .with_arg("b", json!(numbers[1]));
            return Completion::text(
                format!("I'll add {} and {} for you.", numbers[0], numbers[1]),
                MODEL_NAME,
            )
            .with_tool_calls(vec![call]);
        }

        if text.contains("multiply") && numbers.len() >= 2 {
            let call = ToolCall::new("multiply_numbers")
                .with_arg("x", json!(numbers[0]))
                .with_arg("y", json!(numbers[1]));
            return Completion::text(
                format!("I'll multiply {} by {} for you.", numbers[0], numbers[1]),
                MODEL_NAME,
            )
            .with_tool_calls(vec![call]);
        }

        Completion::text(GENERIC_REPLY, MODEL_NAME)
    }
}

/// Extract unsigned decimal tokens in order of appearance
fn extract_numbers(text: &str) -> Vec<i64> {
    let mut numbers = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            if let Ok(n) = current.parse() {
                numbers.push(n);
            }
            current.clear();
        }
    }
    if !current.is_empty() {
        if let Ok(n) = current.parse() {
            numbers.push(n);
        }
    }

    numbers
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        Ok(ProviderInfo {
            name: "Fallback".into(),
            models: vec![ModelInfo {
                id: MODEL_NAME.into(),
                name: "Deterministic fallback".into(),
            }],
            supports_tools: true,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    async fn complete(
        &self,
        messages: &[Message],
        _options: &GenerationOptions,
    ) -> Result<Completion> {
        // System prompts are irrelevant to the pattern table.
        let last = messages.iter().rev().find(|m| m.role != Role::System);
        Ok(Self::respond(last))
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        Ok(vec![ModelInfo {
            id: MODEL_NAME.into(),
            name: "Deterministic fallback".into(),
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn complete(messages: &[Message]) -> Completion {
        FallbackProvider::new()
            .complete(messages, &GenerationOptions::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_help_pattern() {
        let completion = complete(&[Message::user("What can you help me with?")]).await;
        assert!(completion.tool_calls.is_empty());
        assert!(completion.content.contains("mathematical operations"));
    }

    #[tokio::test]
    async fn test_add_pattern_extracts_first_two_numbers() {
        let completion = complete(&[Message::user("Add 15 and 27")]).await;
        assert_eq!(completion.tool_calls.len(), 1);

        let call = &completion.tool_calls[0];
        assert_eq!(call.name, "add_numbers");
        assert_eq!(call.arguments["a"], 15);
        assert_eq!(call.arguments["b"], 27);
        assert!(!call.id.is_empty());
    }

    #[tokio::test]
    async fn test_multiply_pattern() {
        let completion = complete(&[Message::user("Multiply 8 by 9")]).await;
        let call = &completion.tool_calls[0];
        assert_eq!(call.name, "multiply_numbers");
        assert_eq!(call.arguments["x"], 8);
        assert_eq!(call.arguments["y"], 9);
    }

    #[tokio::test]
    async fn test_add_without_enough_numbers_is_generic() {
        let completion = complete(&[Message::user("add 5")]).await;
        assert!(completion.tool_calls.is_empty());
        assert!(completion.content.contains("adding and multiplying"));
    }

    #[tokio::test]
    async fn test_tool_result_is_restated() {
        let messages = vec![
            Message::user("Add 15 and 27"),
            Message::assistant("I'll add 15 and 27 for you."),
            Message::tool("42", "call_add"),
        ];

        let completion = complete(&messages).await;
        assert!(completion.tool_calls.is_empty());
        assert!(completion.content.contains("42"));
    }

    #[tokio::test]
    async fn test_never_fails_on_empty_history() {
        let completion = complete(&[]).await;
        assert!(!completion.content.is_empty());
    }

    #[test]
    fn test_extract_numbers() {
        assert_eq!(extract_numbers("add 15 and 27"), vec![15, 27]);
        assert_eq!(extract_numbers("no digits here"), Vec::<i64>::new());
        assert_eq!(extract_numbers("7x8"), vec![7, 8]);
    }
}
