//! Keyword retrieval over stored chunks.
//!
//! Matching is lexical and permissive: the query is lower-cased and split on
//! whitespace, and a chunk matches when any term is a substring of its
//! lower-cased content. There is no scoring; results come back in storage
//! order and are capped at [`MAX_RESULTS`]. This is a heuristic with no
//! recall or precision guarantee.

use std::collections::HashMap;

use database::{chunk, document, Citation, Database, DocumentChunk, DocumentType};
use serde::Serialize;
use tracing::debug;

use crate::error::Result;

pub const MAX_RESULTS: usize = 10;

/// Length of a citation excerpt, in chars, before the ellipsis.
pub const EXCERPT_CHARS: usize = 200;

/// A matching chunk and the citation that points at it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    pub chunk: DocumentChunk,
    pub citation: Citation,
}

/// Search a user's chunks, optionally restricted to some document types.
///
/// An empty `document_types` slice is treated as no restriction.
pub async fn search_chunks(
    database: &Database,
    user_id: &str,
    query: &str,
    document_types: Option<&[DocumentType]>,
) -> Result<Vec<SearchHit>> {
    let terms: Vec<String> = query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect();
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let document_types = document_types.filter(|types| !types.is_empty());
    let documents = document::list_documents(database.pool(), user_id, document_types).await?;
    if documents.is_empty() {
        return Ok(Vec::new());
    }

    let restrict_to: Option<Vec<String>> =
        document_types.map(|_| documents.iter().map(|d| d.id.clone()).collect());
    let chunks = chunk::list_user_chunks(database.pool(), user_id, restrict_to.as_deref()).await?;

    let names: HashMap<&str, &str> = documents
        .iter()
        .map(|d| (d.id.as_str(), d.file_name.as_str()))
        .collect();

    let hits: Vec<SearchHit> = chunks
        .into_iter()
        .filter(|c| {
            let content = c.content.to_lowercase();
            terms.iter().any(|term| content.contains(term.as_str()))
        })
        .take(MAX_RESULTS)
        .map(|c| {
            let document_name = names
                .get(c.document_id.as_str())
                .copied()
                .unwrap_or("Unknown document")
                .to_string();
            SearchHit {
                citation: citation_for(&c, document_name),
                chunk: c,
            }
        })
        .collect();

    debug!(
        user_id = %user_id,
        query = %query,
        terms = terms.len(),
        hits = hits.len(),
        "Chunk search completed"
    );

    Ok(hits)
}

/// Citation for a chunk of the named document.
pub fn citation_for(chunk: &DocumentChunk, document_name: String) -> Citation {
    Citation {
        document_id: chunk.document_id.clone(),
        document_name,
        page_number: chunk.page_number,
        section_title: chunk.section_title.clone(),
        excerpt: excerpt(&chunk.content),
    }
}

/// The first [`EXCERPT_CHARS`] chars of `content`, plus `...` when truncated.
pub fn excerpt(content: &str) -> String {
    match content.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
