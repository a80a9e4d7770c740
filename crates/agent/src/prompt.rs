//! System prompt for agent turns.

use database::{Document, ProcessingStatus};

const INSTRUCTIONS: &str = "You are a construction document assistant helping engineers, \
inspectors and contractors work with their project documents: plans, specifications, \
standard plans, special provisions and CPM schedules.

Use the tools to look things up instead of answering from memory. Search the documents \
before stating a requirement, use calculate_quantity for any arithmetic, and name the \
document and page you relied on. If the documents do not cover a question, say so.";

/// Build the system prompt with the user's document inventory.
pub fn system_prompt(documents: &[Document]) -> String {
    format!("{}\n\n{}", INSTRUCTIONS, document_inventory(documents))
}

fn document_inventory(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "The user has no documents uploaded yet. Suggest uploading plans or \
                specifications when a question depends on them."
            .to_string();
    }

    let mut lines = vec![format!("The user has {} document(s):", documents.len())];
    for doc in documents {
        let pages = match doc.page_count {
            Some(1) => "1 page".to_string(),
            Some(n) => format!("{} pages", n),
            None => "page count unknown".to_string(),
        };
        let status = match doc.status {
            ProcessingStatus::Completed => "",
            ProcessingStatus::Pending | ProcessingStatus::Processing => ", still processing",
            ProcessingStatus::Failed => ", processing failed",
        };
        lines.push(format!(
            "- {} ({}, {}{})",
            doc.file_name,
            doc.document_type.label(),
            pages,
            status
        ));
    }
    lines.join("\n")
}
