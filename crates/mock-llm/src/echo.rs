//! Echo model - answers with the last message's text.

use assistant_core::{async_trait, ChatMessage, LanguageModel, LlmError, LlmRequest, LlmResponse};

/// A model that echoes the last message back as an assistant message.
///
/// Useful for exercising message plumbing without any scripted behaviour.
#[derive(Debug, Clone, Default)]
pub struct EchoModel {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoModel {
    /// Create a new EchoModel with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoModel with a custom prefix.
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl LanguageModel for EchoModel {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let last = request
            .messages
            .last()
            .and_then(|m| m.text())
            .unwrap_or_default();
        let text = match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last),
            None => last,
        };
        Ok(LlmResponse::from_message(ChatMessage::assistant(text)))
    }

    fn name(&self) -> &str {
        "EchoModel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let model = EchoModel::new();
        let response = model
            .invoke(LlmRequest::new(vec![ChatMessage::user("Hello!")]))
            .await
            .unwrap();
        assert_eq!(response.first_message().unwrap().text().as_deref(), Some("Hello!"));
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let model = EchoModel::with_prefix("Echo: ");
        let response = model
            .invoke(LlmRequest::new(vec![ChatMessage::user("Hello!")]))
            .await
            .unwrap();
        assert_eq!(response.first_message().unwrap().text().as_deref(), Some("Echo: Hello!"));
    }

    #[tokio::test]
    async fn test_model_name() {
        assert_eq!(EchoModel::new().name(), "EchoModel");
    }
}
