//! Error types for agent operations.

use assistant_core::LlmError;
use database::DatabaseError;
use documents::ProcessingError;
use thiserror::Error;

/// Errors that can occur while running the agent, a chat turn or a report.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Store access failed.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// Retrieval failed.
    #[error(transparent)]
    Processing(#[from] ProcessingError),

    /// The language model call failed.
    #[error("language model error: {0}")]
    Llm(#[from] LlmError),

    /// The language model answered without a usable message.
    #[error("language model returned no message")]
    EmptyResponse,

    /// The model asked for a tool outside the palette.
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    /// Tool arguments did not match the tool's schema.
    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// Caller input was rejected.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
