//! Collaborator contracts for the construction document assistant.
//!
//! The core components never talk to a concrete LLM provider, storage bucket
//! or notification channel directly. They are handed implementations of the
//! traits defined here:
//!
//! - [`LanguageModel`] - chat-completion invocation with optional tool schemas
//! - [`BlobStore`] - raw document bytes in, URL out
//! - [`OwnerNotifier`] - best-effort owner notifications
//!
//! plus the wire types those traits exchange ([`ChatMessage`], [`ToolCall`],
//! [`ToolDefinition`], ...).
//!
//! # Example
//!
//! ```rust
//! use assistant_core::{async_trait, ChatMessage, LanguageModel, LlmError, LlmRequest, LlmResponse};
//!
//! struct Parrot;
//!
//! #[async_trait]
//! impl LanguageModel for Parrot {
//!     async fn invoke(&self, request: LlmRequest) -> Result<LlmResponse, LlmError> {
//!         let last = request.messages.last().and_then(|m| m.text()).unwrap_or_default();
//!         Ok(LlmResponse::from_message(ChatMessage::assistant(last)))
//!     }
//!
//!     fn name(&self) -> &str {
//!         "Parrot"
//!     }
//! }
//! ```

mod blob;
mod digest;
mod error;
mod llm;
mod message;
mod notify;
mod timeout;
mod tools;

pub use blob::{BlobStore, LocalBlobStore, MemoryBlobStore, StoredBlob};
pub use digest::sha256_hex;
pub use error::{BlobError, LlmError, NotifyError};
pub use llm::{Choice, LanguageModel, LlmRequest, LlmResponse, ToolChoice, Usage};
pub use message::{ChatMessage, ContentPart, FileReference, MessageContent, Role};
pub use notify::{
    notify_detached, CollectingNotifier, LoggingNotifier, NoOpNotifier, Notification,
    OwnerNotifier,
};
pub use timeout::TimeoutModel;
pub use tools::{FunctionCall, FunctionDefinition, ToolCall, ToolDefinition};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
