//! [`LanguageModel`] implementation over HTTP.

use std::time::{Duration, Instant};

use assistant_core::{async_trait, LanguageModel, LlmError, LlmRequest, LlmResponse};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiError, ChatCompletionRequest};
use crate::config::LlmConfig;

/// A language model reached through an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiModel {
    client: Client,
    config: LlmConfig,
}

impl OpenAiModel {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("API key is empty".to_string()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            "OpenAiModel initialized with model: {}, endpoint: {}",
            config.model, config.api_url
        );

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`LlmConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::new(LlmConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.config.api_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl LanguageModel for OpenAiModel {
    async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: &request.messages,
            tools: request.tools.as_deref(),
            tool_choice: request.tool_choice,
            response_format: request.response_format.as_ref(),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(
            "Sending {} messages ({} tools) to {}",
            request.messages.len(),
            request.tools.as_ref().map_or(0, |t| t.len()),
            self.config.model
        );

        let started = Instant::now();
        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(Duration::from_secs(self.config.timeout_secs))
                } else {
                    LlmError::Network(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => api_error.error.message,
                Err(_) => error_text,
            };

            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: LlmResponse = response
            .json()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(Duration::from_secs(self.config.timeout_secs))
                } else {
                    LlmError::InvalidResponse(format!("Failed to parse response: {}", e))
                }
            })?;

        if let Some(usage) = completion.usage {
            debug!(
                "Token usage - prompt: {}, completion: {}, total: {} ({} ms)",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens,
                started.elapsed().as_millis()
            );
        }

        Ok(completion)
    }

    fn name(&self) -> &str {
        &self.config.model
    }
}
