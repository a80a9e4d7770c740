//! Document ingestion and retrieval.
//!
//! - [`chunker`] splits extracted text into overlapping, boundary-aware chunks.
//! - [`sections`] finds structural headers and estimates page numbers.
//! - [`metadata`] tags chunks with construction keywords and a content type.
//! - [`DocumentProcessor`] runs extraction, chunking and persistence for one
//!   document and drives its processing status.
//! - [`search_chunks`] is the keyword retrieval used by the chat agent.
//! - [`DocumentService`] accepts uploads and starts detached processing.

pub mod chunker;
mod error;
mod file_kind;
pub mod metadata;
mod processor;
mod search;
pub mod sections;
mod service;

pub use chunker::{chunk_text, Chunker, TextChunk};
pub use error::{ProcessingError, Result};
pub use file_kind::FileKind;
pub use processor::{DocumentProcessor, ProcessedDocument, ProcessorConfig};
pub use search::{citation_for, excerpt, search_chunks, SearchHit, EXCERPT_CHARS, MAX_RESULTS};
pub use sections::{detect_sections, estimate_page, section_for_offset, Section};
pub use service::{DocumentService, UploadRequest, DEFAULT_MAX_UPLOAD_BYTES};
