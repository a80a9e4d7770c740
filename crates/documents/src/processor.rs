//! Document processing pipeline.
//!
//! A document moves `pending -> processing -> completed | failed`. Processing
//! extracts the text (through the language model for PDF and Word files,
//! straight from the blob store for plain text), detects sections, chunks the
//! text, stores every chunk in one transaction and finally records the text,
//! page count and metadata on the document.
//!
//! Failure is terminal: the document is marked `failed` and the error is
//! returned to whoever awaited the run. Nothing is retried.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use assistant_core::{BlobStore, ChatMessage, LanguageModel, LlmRequest};
use database::{document, Database, Document, DocumentMetadata, NewChunk};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::chunker::Chunker;
use crate::error::{ProcessingError, Result};
use crate::file_kind::FileKind;
use crate::metadata::chunk_metadata;
use crate::sections::{detect_sections, estimate_page, section_for_offset, Section};

/// Tunables for chunking and page estimation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorConfig {
    /// Chunk window, in chars.
    pub chunk_size: usize,
    /// Overlap between consecutive chunks, in chars.
    pub chunk_overlap: usize,
    /// Chunks shorter than this (after trimming) are dropped.
    pub min_chunk_chars: usize,
    /// Page estimate for plain text.
    pub chars_per_page: usize,
    /// Token the model is told to insert between pages.
    pub page_break_marker: String,
    /// Section titles kept in document metadata.
    pub max_sections: usize,
    /// Keywords kept in document metadata.
    pub max_keywords: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            chunk_size: 2000,
            chunk_overlap: 200,
            min_chunk_chars: 50,
            chars_per_page: 3000,
            page_break_marker: "[PAGE BREAK]".to_string(),
            max_sections: 50,
            max_keywords: 25,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedDocument {
    pub document_id: String,
    pub page_count: i64,
    pub chunk_count: usize,
    pub text_chars: usize,
}

/// Turns uploaded documents into searchable chunks.
#[derive(Clone)]
pub struct DocumentProcessor {
    database: Database,
    blobs: Arc<dyn BlobStore>,
    model: Arc<dyn LanguageModel>,
    config: ProcessorConfig,
}

impl DocumentProcessor {
    pub fn new(
        database: Database,
        blobs: Arc<dyn BlobStore>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            database,
            blobs,
            model,
            config: ProcessorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    /// Process a document on a background task.
    ///
    /// The caller may drop the handle; the outcome is then only visible
    /// through the document's status.
    pub fn spawn(&self, document: Document) -> JoinHandle<Result<ProcessedDocument>> {
        let processor = self.clone();
        tokio::spawn(async move { processor.process(&document).await })
    }

    /// Process a document to completion, marking it `failed` on any error.
    pub async fn process(&self, doc: &Document) -> Result<ProcessedDocument> {
        info!(
            document_id = %doc.id,
            file_name = %doc.file_name,
            "Processing document"
        );
        document::mark_processing(self.database.pool(), &doc.id, &doc.user_id).await?;

        match self.ingest(doc).await {
            Ok(processed) => {
                info!(
                    document_id = %doc.id,
                    pages = processed.page_count,
                    chunks = processed.chunk_count,
                    "Document processing completed"
                );
                Ok(processed)
            }
            Err(e) => {
                error!(document_id = %doc.id, error = %e, "Document processing failed");
                if let Err(mark_err) =
                    document::mark_failed(self.database.pool(), &doc.id, &doc.user_id).await
                {
                    warn!(document_id = %doc.id, error = %mark_err, "Could not mark document failed");
                }
                Err(e)
            }
        }
    }

    async fn ingest(&self, doc: &Document) -> Result<ProcessedDocument> {
        let (text, page_count) = self.extract(doc).await?;
        let sections = detect_sections(&text);
        let chunks = self.build_chunks(doc, &text, page_count, &sections);

        let metadata = self.document_metadata(doc, &sections, &chunks);
        document::complete_with_chunks(
            self.database.pool(),
            &doc.id,
            &doc.user_id,
            &text,
            page_count,
            &metadata,
            &chunks,
        )
        .await?;

        Ok(ProcessedDocument {
            document_id: doc.id.clone(),
            page_count,
            chunk_count: chunks.len(),
            text_chars: text.chars().count(),
        })
    }

    /// Extracted text and page count.
    async fn extract(&self, doc: &Document) -> Result<(String, i64)> {
        let kind = FileKind::detect(&doc.file_type, &doc.file_name)
            .ok_or_else(|| ProcessingError::UnsupportedFileType(doc.file_type.clone()))?;

        if kind.needs_model_extraction() {
            let text = self.extract_with_model(doc).await?;
            let page_count = text.matches(self.config.page_break_marker.as_str()).count() as i64 + 1;
            return Ok((text, page_count));
        }

        let bytes = self.blobs.get(&doc.storage_key).await?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        let page_count = text
            .chars()
            .count()
            .div_ceil(self.config.chars_per_page.max(1))
            .max(1) as i64;
        Ok((text, page_count))
    }

    async fn extract_with_model(&self, doc: &Document) -> Result<String> {
        let request = LlmRequest::new(vec![
            ChatMessage::system(extraction_prompt(&self.config.page_break_marker)),
            ChatMessage::user_with_file(
                "Extract all text from this document.",
                doc.storage_url.as_str(),
                doc.file_type.as_str(),
            ),
        ]);

        let started = Instant::now();
        let response = self.model.invoke(request).await?;
        debug!(
            document_id = %doc.id,
            model = self.model.name(),
            latency_ms = started.elapsed().as_millis() as u64,
            usage = ?response.usage,
            "Extraction response received"
        );

        response
            .into_first_message()
            .and_then(|message| message.text())
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| ProcessingError::EmptyExtraction(doc.id.clone()))
    }

    fn build_chunks(
        &self,
        doc: &Document,
        text: &str,
        page_count: i64,
        sections: &[Section],
    ) -> Vec<NewChunk> {
        let total_chars = text.chars().count();
        let chunker = Chunker::new(self.config.chunk_size, self.config.chunk_overlap)
            .with_min_chars(self.config.min_chunk_chars);

        chunker
            .chunk(text)
            .into_iter()
            .enumerate()
            .map(|(index, chunk)| NewChunk {
                document_id: doc.id.clone(),
                user_id: doc.user_id.clone(),
                chunk_index: index as i64,
                page_number: Some(estimate_page(chunk.start, total_chars, page_count)),
                section_title: section_for_offset(sections, chunk.start).map(|s| s.title.clone()),
                start_offset: Some(chunk.start as i64),
                end_offset: Some(chunk.end as i64),
                metadata: chunk_metadata(&chunk.content),
                content: chunk.content,
            })
            .collect()
    }

    fn document_metadata(
        &self,
        doc: &Document,
        sections: &[Section],
        chunks: &[NewChunk],
    ) -> DocumentMetadata {
        let mut seen = HashSet::new();
        let keywords = chunks
            .iter()
            .flat_map(|chunk| chunk.metadata.keywords.iter())
            .filter(|keyword| seen.insert(keyword.as_str()))
            .take(self.config.max_keywords)
            .cloned()
            .collect();

        DocumentMetadata {
            title: Some(
                sections
                    .first()
                    .map(|s| s.title.clone())
                    .unwrap_or_else(|| doc.file_name.clone()),
            ),
            sections: sections
                .iter()
                .take(self.config.max_sections)
                .map(|s| s.title.clone())
                .collect(),
            keywords,
            ..doc.metadata.0.clone()
        }
    }
}

fn extraction_prompt(page_break_marker: &str) -> String {
    format!(
        "You extract text from construction documents. Return the complete text of the \
         attached file verbatim, preserving headings, numbering, tables and paragraph \
         breaks. Do not summarize or comment. Insert the token {} on its own line between \
         pages.",
        page_break_marker
    )
}
