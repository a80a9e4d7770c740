//! OpenAI-compatible chat-completions client.
//!
//! [`OpenAiModel`] implements [`assistant_core::LanguageModel`] against any
//! endpoint that speaks the `/v1/chat/completions` protocol with function
//! tools (OpenAI, OpenRouter, local gateways, ...).
//!
//! ```rust,no_run
//! use assistant_core::{ChatMessage, LanguageModel, LlmRequest};
//! use openai_llm::OpenAiModel;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let model = OpenAiModel::from_env()?;
//!     let response = model
//!         .invoke(LlmRequest::new(vec![ChatMessage::user("What is a CPM schedule?")]))
//!         .await?;
//!     println!("{:?}", response.first_message().and_then(|m| m.text()));
//!     Ok(())
//! }
//! ```

mod api_types;
mod client;
mod config;

pub use client::OpenAiModel;
pub use config::{LlmConfig, LlmConfigBuilder};

// Re-export core types for convenience
pub use assistant_core::{LanguageModel, LlmError, LlmRequest, LlmResponse};
