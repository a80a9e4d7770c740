//! The language-model collaborator contract.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::LlmError;
use crate::message::ChatMessage;
use crate::tools::ToolDefinition;

/// How the model may use the offered tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolChoice {
    /// The model decides whether to call zero or more tools.
    Auto,
    /// The model must not call tools.
    None,
    /// The model must call at least one tool.
    Required,
}

/// A single model invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LlmRequest {
    /// Conversation so far, oldest first.
    pub messages: Vec<ChatMessage>,
    /// Tool schemas offered to the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    /// Tool usage policy; only meaningful when `tools` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<ToolChoice>,
    /// Provider-specific response format (e.g. a JSON schema).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<Value>,
}

impl LlmRequest {
    /// Create a request without tools.
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Offer tools to the model.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>, choice: ToolChoice) -> Self {
        self.tools = Some(tools);
        self.tool_choice = Some(choice);
        self
    }

    /// Request a specific response format.
    pub fn with_response_format(mut self, format: Value) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// A response choice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    /// Choice index.
    #[serde(default)]
    pub index: u32,
    /// The message, absent on some degenerate provider responses.
    #[serde(default)]
    pub message: Option<ChatMessage>,
    /// Finish reason.
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

/// The result of a model invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Provider response ID.
    #[serde(default)]
    pub id: Option<String>,
    /// Model that produced the response.
    #[serde(default)]
    pub model: Option<String>,
    /// Response choices.
    #[serde(default)]
    pub choices: Vec<Choice>,
    /// Token usage.
    #[serde(default)]
    pub usage: Option<Usage>,
}

impl LlmResponse {
    /// A response with a single choice holding the given message.
    pub fn from_message(message: ChatMessage) -> Self {
        Self {
            choices: vec![Choice {
                index: 0,
                message: Some(message),
                finish_reason: Some("stop".to_string()),
            }],
            ..Default::default()
        }
    }

    /// A response with no choices at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The first choice's message, if any.
    pub fn first_message(&self) -> Option<&ChatMessage> {
        self.choices.first().and_then(|choice| choice.message.as_ref())
    }

    /// Take ownership of the first choice's message, if any.
    pub fn into_first_message(self) -> Option<ChatMessage> {
        self.choices.into_iter().next().and_then(|choice| choice.message)
    }
}

/// A chat-completion endpoint.
///
/// Implementations send the messages (and optional tool schemas) to a model
/// and return its reply. They must not retry tool execution themselves: tool
/// calls in the returned message are executed by the caller.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Invoke the model once.
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, LlmError>;

    /// Identifier of the model or implementation (used for logging and message metadata).
    fn name(&self) -> &str;
}
