//! Chat model interface
//!
//! The agent talks to language models through [`ChatModel`]:
//! `invoke(messages) -> { content, usage }`, optionally with tool
//! definitions for the discovery loop.

pub mod openai;

pub use openai::OpenAiChatModel;

use crate::error::LlmError;
use async_trait::async_trait;
use semgen_model::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions
    System,
    /// Caller input
    User,
    /// Model output
    Assistant,
    /// Tool result
    Tool,
}

/// One conversation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author
    pub role: Role,
    /// Text content
    pub content: String,
    /// Tool call this message answers (tool messages only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Tool calls requested (assistant messages only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
}

impl ChatMessage {
    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call_id: None,
            tool_calls: Vec::new(),
        }
    }

    /// System message
    #[inline]
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// User message
    #[inline]
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Assistant message
    #[inline]
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Assistant message requesting tool calls
    #[inline]
    #[must_use]
    pub fn assistant_with_tool_calls(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(Role::Assistant, content)
        }
    }

    /// Tool result message
    #[inline]
    #[must_use]
    pub fn tool(tool_call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            ..Self::new(Role::Tool, content)
        }
    }
}

/// Tool invocation requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Provider assigned call id
    pub id: String,
    /// Tool name
    pub name: String,
    /// Decoded arguments
    pub arguments: Value,
}

/// Tool offered to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name
    pub name: String,
    /// What the tool does
    pub description: String,
    /// JSON Schema of the arguments
    pub parameters: Value,
}

/// Model reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatResponse {
    /// Text content
    pub content: String,
    /// Tokens consumed by this call
    pub usage: TokenUsage,
    /// Requested tool calls
    pub tool_calls: Vec<ToolCall>,
}

impl ChatResponse {
    /// Plain text response
    #[inline]
    #[must_use]
    pub fn text(content: impl Into<String>, usage: TokenUsage) -> Self {
        Self {
            content: content.into(),
            usage,
            tool_calls: Vec::new(),
        }
    }
}

/// Chat-style language model
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Run one completion over the conversation
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError>;

    /// Run one completion with tools available
    ///
    /// Models without tool support ignore the tools.
    async fn invoke_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        let _ = tools;
        self.invoke(messages).await
    }

    /// Model name for logging
    fn model_name(&self) -> &str;
}

/// Extract the JSON object from a model reply
///
/// Handles fenced code blocks and prose around the object. Returns the
/// trimmed input when no object boundaries are found.
#[must_use]
pub fn extract_json(response: &str) -> &str {
    let trimmed = response.trim();

    if let Some(rest) = trimmed.strip_prefix("```") {
        // Skip the info string (e.g. "json") up to the first newline
        let body = rest.find('\n').map_or(rest, |nl| &rest[nl + 1..]);
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    }
}
