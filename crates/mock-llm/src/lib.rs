//! Language-model test doubles.
//!
//! - [`ScriptedModel`] - replays a queue of canned responses and records requests
//! - [`EchoModel`] - answers with the text of the last message
//!
//! For production use the `openai-llm` crate.
//!
//! # Example
//!
//! ```rust
//! use mock_llm::{ChatMessage, LanguageModel, LlmRequest, ScriptedModel};
//!
//! #[tokio::main]
//! async fn main() {
//!     let model = ScriptedModel::new().with_text("The slab is 6 inches thick.");
//!
//!     let response = model
//!         .invoke(LlmRequest::new(vec![ChatMessage::user("How thick is the slab?")]))
//!         .await
//!         .unwrap();
//!     assert_eq!(
//!         response.first_message().and_then(|m| m.text()).as_deref(),
//!         Some("The slab is 6 inches thick.")
//!     );
//! }
//! ```

mod echo;
mod scripted;

// Re-export core types for convenience
pub use assistant_core::{
    async_trait, ChatMessage, LanguageModel, LlmError, LlmRequest, LlmResponse, ToolCall,
};

pub use echo::EchoModel;
pub use scripted::ScriptedModel;
