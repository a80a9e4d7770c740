//! Error types for document ingestion.

use assistant_core::{BlobError, LlmError};
use database::DatabaseError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProcessingError {
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("blob store error: {0}")]
    Blob(#[from] BlobError),

    #[error("extraction failed: {0}")]
    Llm(#[from] LlmError),

    /// The model answered without any text for the document.
    #[error("no text extracted from document {0}")]
    EmptyExtraction(String),

    /// Upload of a file type that cannot be processed.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Upload rejected before anything was stored.
    #[error("invalid upload: {0}")]
    InvalidUpload(String),
}

pub type Result<T> = std::result::Result<T, ProcessingError>;
