//! OpenAI-compatible chat completions client

use super::{ChatMessage, ChatModel, ChatResponse, Role, ToolCall, ToolDefinition};
use crate::config::LlmConfig;
use crate::error::LlmError;
use async_trait::async_trait;
use semgen_model::TokenUsage;
use serde::Deserialize;
use serde_json::{json, Value};

/// Chat model backed by an OpenAI-compatible `/chat/completions` endpoint
#[derive(Debug, Clone)]
pub struct OpenAiChatModel {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl OpenAiChatModel {
    /// Create client from configuration and an API key
    ///
    /// # Errors
    /// - `LlmError::Config` if the key is empty or the HTTP client cannot be built
    pub fn from_config(config: &LlmConfig, api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LlmError::Config(format!(
                "API key is empty (set {})",
                config.api_key_env
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LlmError::Config(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    /// Create client reading the API key from the configured environment variable
    ///
    /// # Errors
    /// - `LlmError::Config` if the variable is unset or empty
    pub fn from_env(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| LlmError::Config(format!("{} is not set", config.api_key_env)))?;
        Self::from_config(config, api_key)
    }

    /// Completion endpoint URL
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(&self, messages: &[ChatMessage], tools: &[ToolDefinition]) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": messages.iter().map(wire_message).collect::<Vec<_>>(),
            "temperature": self.temperature,
        });

        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }

        if !tools.is_empty() {
            body["tools"] = tools
                .iter()
                .map(|tool| {
                    json!({
                        "type": "function",
                        "function": {
                            "name": tool.name,
                            "description": tool.description,
                            "parameters": tool.parameters,
                        }
                    })
                })
                .collect();
        }

        body
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        let body = self.request_body(messages, tools);

        tracing::debug!(
            model = %self.model,
            messages = messages.len(),
            tools = tools.len(),
            "sending chat completion request"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: Completion = response
            .json()
            .await
            .map_err(|e| LlmError::Decode(e.to_string()))?;

        completion.into_response()
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn invoke(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError> {
        self.complete(messages, &[]).await
    }

    async fn invoke_with_tools(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<ChatResponse, LlmError> {
        self.complete(messages, tools).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn transport_error(e: reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout
    } else {
        LlmError::Transport(e.to_string())
    }
}

fn wire_message(message: &ChatMessage) -> Value {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let mut wire = json!({ "role": role, "content": message.content });

    if let Some(id) = &message.tool_call_id {
        wire["tool_call_id"] = json!(id);
    }

    if !message.tool_calls.is_empty() {
        wire["tool_calls"] = message
            .tool_calls
            .iter()
            .map(|call| {
                json!({
                    "id": call.id,
                    "type": "function",
                    "function": {
                        "name": call.name,
                        "arguments": call.arguments.to_string(),
                    }
                })
            })
            .collect();
    }

    wire
}

#[derive(Debug, Deserialize)]
struct Completion {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct WireMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<WireToolCall>,
}

#[derive(Debug, Deserialize)]
struct WireToolCall {
    id: String,
    function: WireFunction,
}

#[derive(Debug, Deserialize)]
struct WireFunction {
    name: String,
    #[serde(default)]
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct WireUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

impl Completion {
    fn into_response(self) -> Result<ChatResponse, LlmError> {
        let usage = self
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        let choice = self.choices.into_iter().next().ok_or(LlmError::EmptyResponse)?;

        let tool_calls = choice
            .message
            .tool_calls
            .into_iter()
            .map(|call| {
                // Malformed argument strings are passed through as a JSON string
                let arguments = serde_json::from_str(&call.function.arguments)
                    .unwrap_or(Value::String(call.function.arguments));
                ToolCall {
                    id: call.id,
                    name: call.function.name,
                    arguments,
                }
            })
            .collect::<Vec<_>>();

        let content = choice.message.content.unwrap_or_default();
        if content.is_empty() && tool_calls.is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        Ok(ChatResponse {
            content,
            usage,
            tool_calls,
        })
    }
}
