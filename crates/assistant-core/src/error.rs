//! Error types for collaborator operations.

use std::time::Duration;

use thiserror::Error;

/// Errors returned by a [`LanguageModel`](crate::LanguageModel).
#[derive(Debug, Error)]
pub enum LlmError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never reached the provider or the connection dropped.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The provider answered with something we could not decode.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The call did not complete within the allotted time.
    #[error("LLM call timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors returned by a [`BlobStore`](crate::BlobStore).
#[derive(Debug, Error)]
pub enum BlobError {
    /// Filesystem error.
    #[error("blob I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No blob stored under the key.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The key is empty or escapes the store root.
    #[error("invalid blob key: {0}")]
    InvalidKey(String),

    /// Remote storage rejected the request.
    #[error("blob upload failed: {0}")]
    Upload(String),
}

/// Errors returned by an [`OwnerNotifier`](crate::OwnerNotifier).
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The notification could not be delivered.
    #[error("notification delivery failed: {0}")]
    Delivery(String),
}
