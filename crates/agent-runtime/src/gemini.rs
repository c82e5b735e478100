//! Gemini LLM Provider
//!
//! Implementation of `LlmProvider` for the Google Generative Language API.

use agent_core::{
    error::{AgentError, Result},
    message::{Message, Role},
    provider::{Completion, FinishReason, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo, TokenUsage},
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini provider configuration
#[derive(Clone, Debug)]
pub struct GeminiConfig {
    /// Google API key
    pub api_key: String,

    /// API base URL (overridable for testing)
    pub api_base: String,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.into(),
        }
    }
}

/// Gemini LLM provider
pub struct GeminiProvider {
    client: reqwest::Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a new Gemini provider
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::from_config(GeminiConfig::new(api_key))
    }

    /// Create from configuration
    pub fn from_config(config: GeminiConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Convert agent messages into the Gemini request body
    ///
    /// Gemini takes the system prompt separately; tool results appear as user
    /// context, matching the Ollama conversion.
    fn build_request(messages: &[Message], options: &GenerationOptions) -> GenerateRequest {
        let mut system_parts = Vec::new();
        let mut contents: Vec<Content> = Vec::new();

        for message in messages {
            match message.role {
                Role::System => system_parts.push(Part {
                    text: message.content.clone(),
                }),
                Role::User | Role::Tool => contents.push(Content {
                    role: "user".into(),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
                Role::Assistant => contents.push(Content {
                    role: "model".into(),
                    parts: vec![Part {
                        text: message.content.clone(),
                    }],
                }),
            }
        }

        GenerateRequest {
            contents,
            system_instruction: if system_parts.is_empty() {
                None
            } else {
                Some(SystemInstruction {
                    parts: system_parts,
                })
            },
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: options.top_p,
                max_output_tokens: options.max_tokens,
            },
        }
    }

    fn convert_finish_reason(reason: Option<&str>) -> Option<FinishReason> {
        reason.map(|r| match r {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" => FinishReason::ContentFilter,
            _ => FinishReason::Error,
        })
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn info(&self) -> Result<ProviderInfo> {
        let models = self.list_models().await.unwrap_or_default();

        Ok(ProviderInfo {
            name: "Gemini".into(),
            models,
            supports_tools: false, // Tool calls are parsed from fenced blocks
        })
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!(
            "{}/v1beta/models?key={}",
            self.config.api_base, self.config.api_key
        );

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(e) => {
                tracing::warn!("Gemini health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn complete(
        &self,
        messages: &[Message],
        options: &GenerationOptions,
    ) -> Result<Completion> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.config.api_base, options.model, self.config.api_key
        );

        let request = Self::build_request(messages, options);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "Gemini API returned {}: {}",
                status, body
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("malformed Gemini response: {}", e)))?;

        let candidate = body
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::Provider("Gemini returned no candidates".into()))?;

        let content = candidate
            .content
            .map(|c| {
                c.parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        Ok(Completion {
            content,
            model: options.model.clone(),
            tool_calls: Vec::new(),
            usage: body.usage_metadata.map(|u| TokenUsage {
                prompt_tokens: u.prompt_token_count,
                completion_tokens: u.candidates_token_count,
                total_tokens: u.total_token_count,
            }),
            finish_reason: Self::convert_finish_reason(candidate.finish_reason.as_deref()),
        })
    }

    async fn list_models(&self) -> Result<Vec<ModelInfo>> {
        let url = format!(
            "{}/v1beta/models?key={}",
            self.config.api_base, self.config.api_key
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgentError::ProviderUnavailable(e.to_string()))?;

        let body: ListModelsResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("malformed Gemini response: {}", e)))?;

        Ok(body
            .models
            .into_iter()
            .map(|m| ModelInfo {
                id: m.name.trim_start_matches("models/").to_string(),
                name: m.display_name.unwrap_or(m.name),
            })
            .collect())
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<SystemInstruction>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_p: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ListModelsResponse {
    #[serde(default)]
    models: Vec<ApiModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiModel {
    name: String,
    display_name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_separates_system_prompt() {
        let messages = vec![
            Message::system("You are helpful."),
            Message::user("Hello"),
            Message::assistant("Hi!"),
        ];

        let request = GeminiProvider::build_request(&messages, &GenerationOptions::default());
        assert!(request.system_instruction.is_some());
        assert_eq!(request.contents.len(), 2);
        assert_eq!(request.contents[0].role, "user");
        assert_eq!(request.contents[1].role, "model");
    }

    #[test]
    fn test_finish_reason_mapping() {
        assert_eq!(
            GeminiProvider::convert_finish_reason(Some("STOP")),
            Some(FinishReason::Stop)
        );
        assert_eq!(
            GeminiProvider::convert_finish_reason(Some("MAX_TOKENS")),
            Some(FinishReason::Length)
        );
        assert_eq!(GeminiProvider::convert_finish_reason(None), None);
    }
}
