//! # agent-core
//!
//! Core agent logic with provider-agnostic LLM abstraction, schema-validated
//! tool dispatch, and an append-only conversation model.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     Orchestrator                             │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │ AwaitingModel│─│AwaitingTools│  │   LlmProvider       │  │
//! │  │   ⇄ cycle   │  │  dispatch   │──│   (Strategy)        │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │         │               │                                    │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │  ThreadStore │  │ToolRegistry │  │  ResourceCatalog    │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `LlmProvider` trait enables swapping between Ollama, Gemini, the
//! deterministic fallback, or any other backend without changing agent logic.

pub mod error;
pub mod message;
pub mod orchestrator;
pub mod provider;
pub mod resource;
pub mod thread;
pub mod tool;

pub use error::{AgentError, Result};
pub use message::{Conversation, Message, Role};
pub use orchestrator::{Agent, AgentBuilder, AgentConfig};
pub use provider::{Completion, GenerationOptions, LlmProvider, ModelInfo, ProviderInfo};
pub use resource::{Resource, ResourceCatalog, ResourceSpec};
pub use thread::{Thread, ThreadId, ThreadStore};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult, ToolSchema};
