//! Scripted model - replays queued responses in order.

use std::collections::VecDeque;

use assistant_core::{
    async_trait, ChatMessage, LanguageModel, LlmError, LlmRequest, LlmResponse, ToolCall,
};
use tokio::sync::Mutex;

/// A model that returns pre-programmed responses in FIFO order and records
/// every request it receives.
///
/// Once the script is exhausted it answers with [`LlmResponse::empty`], a
/// response without any message.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    script: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ScriptedModel {
    /// Create a model with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an arbitrary response.
    pub fn with_response(mut self, response: LlmResponse) -> Self {
        self.script.get_mut().push_back(Ok(response));
        self
    }

    /// Queue a plain assistant text reply.
    pub fn with_text(self, text: impl Into<String>) -> Self {
        self.with_response(LlmResponse::from_message(ChatMessage::assistant(text)))
    }

    /// Queue an assistant reply that requests the given tool calls.
    pub fn with_tool_calls(self, calls: Vec<ToolCall>) -> Self {
        self.with_response(LlmResponse::from_message(ChatMessage::assistant_tool_calls(
            None, calls,
        )))
    }

    /// Queue a response that carries no message at all.
    pub fn with_empty(self) -> Self {
        self.with_response(LlmResponse::empty())
    }

    /// Queue an error.
    pub fn with_error(mut self, error: LlmError) -> Self {
        self.script.get_mut().push_back(Err(error));
        self
    }

    /// Requests received so far, oldest first.
    pub async fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of invocations so far.
    pub async fn call_count(&self) -> usize {
        self.requests.lock().await.len()
    }

    /// Number of scripted responses not yet consumed.
    pub async fn remaining(&self) -> usize {
        self.script.lock().await.len()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().await.push(request);
        self.script
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(LlmResponse::empty()))
    }

    fn name(&self) -> &str {
        "ScriptedModel"
    }
}
