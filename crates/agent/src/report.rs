//! Written reports over a user's processed documents.

use std::sync::Arc;

use assistant_core::{ChatMessage, LanguageModel, LlmRequest};
use database::{
    conversation, document, report, Database, Document, NewReport, ProcessingStatus, Report,
    ReportMetadata, ReportType,
};
use tracing::{debug, info};

use crate::error::{AgentError, Result};

/// Default per-document cap on extracted text sent to the model.
pub const DEFAULT_MAX_SOURCE_CHARS: usize = 12_000;

/// Generates and stores reports.
#[derive(Clone)]
pub struct ReportGenerator {
    database: Database,
    model: Arc<dyn LanguageModel>,
    max_source_chars: usize,
}

impl ReportGenerator {
    pub fn new(database: Database, model: Arc<dyn LanguageModel>) -> Self {
        Self {
            database,
            model,
            max_source_chars: DEFAULT_MAX_SOURCE_CHARS,
        }
    }

    pub fn with_max_source_chars(mut self, max_source_chars: usize) -> Self {
        self.max_source_chars = max_source_chars.max(1);
        self
    }

    /// Write a report from the given documents, or from every completed
    /// document of the user when `document_ids` is `None`.
    pub async fn generate(
        &self,
        user_id: &str,
        report_type: ReportType,
        title: &str,
        document_ids: Option<&[String]>,
        conversation_id: Option<&str>,
    ) -> Result<Report> {
        let title = title.trim();
        if title.is_empty() {
            return Err(AgentError::InvalidInput("report title is empty".to_string()));
        }

        let pool = self.database.pool();
        if let Some(conversation_id) = conversation_id {
            conversation::get_conversation(pool, conversation_id, user_id).await?;
        }

        let documents: Vec<Document> = match document_ids {
            Some(ids) => {
                let mut selected = Vec::with_capacity(ids.len());
                for id in ids {
                    selected.push(document::get_document(pool, id, user_id).await?);
                }
                selected
            }
            None => document::list_completed_documents(pool, user_id).await?,
        };

        let sources: Vec<&Document> = documents
            .iter()
            .filter(|doc| doc.status == ProcessingStatus::Completed)
            .filter(|doc| doc.extracted_text.as_deref().is_some_and(|t| !t.trim().is_empty()))
            .collect();
        if sources.is_empty() {
            return Err(AgentError::InvalidInput(
                "no processed documents to report on".to_string(),
            ));
        }

        debug!(user_id = %user_id, sources = sources.len(), report_type = report_type.as_str(), "Generating report");

        let messages = vec![
            ChatMessage::system(report_instructions(report_type)),
            ChatMessage::user(self.source_prompt(title, &sources)),
        ];
        let response = self.model.invoke(LlmRequest::new(messages)).await?;
        let model = response
            .model
            .clone()
            .unwrap_or_else(|| self.model.name().to_string());
        let content = response
            .into_first_message()
            .and_then(|m| m.text())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(AgentError::EmptyResponse)?;

        let saved = report::create_report(
            pool,
            &NewReport {
                user_id: user_id.to_string(),
                conversation_id: conversation_id.map(str::to_string),
                title: title.to_string(),
                report_type,
                content,
                source_document_ids: sources.iter().map(|d| d.id.clone()).collect(),
                metadata: ReportMetadata {
                    document_names: sources.iter().map(|d| d.file_name.clone()).collect(),
                    model: Some(model),
                },
            },
        )
        .await?;

        info!(report_id = %saved.id, user_id = %user_id, "Report generated");
        Ok(saved)
    }

    fn source_prompt(&self, title: &str, sources: &[&Document]) -> String {
        let mut prompt = format!("Report title: {}\n\nSource documents:\n", title);
        for doc in sources {
            let text = doc.extracted_text.as_deref().unwrap_or_default();
            let text = match text.char_indices().nth(self.max_source_chars) {
                Some((idx, _)) => format!("{}\n[truncated]", &text[..idx]),
                None => text.to_string(),
            };
            prompt.push_str(&format!(
                "\n=== {} ({}) ===\n{}\n",
                doc.file_name,
                doc.document_type.label(),
                text
            ));
        }
        prompt
    }
}

fn report_instructions(report_type: ReportType) -> String {
    let focus = match report_type {
        ReportType::Summary => "Summarize the scope, key requirements and notable constraints.",
        ReportType::SpecificationReview => {
            "Review the specifications: list material requirements, tolerances, testing and submittals."
        }
        ReportType::ScheduleAnalysis => {
            "Analyze the schedule: milestones, durations, critical path activities and risks."
        }
        ReportType::ConflictAnalysis => {
            "Identify statements that conflict between documents and say which governs if stated."
        }
        ReportType::QuantityTakeoff => {
            "List bid items and quantities with units, showing any arithmetic."
        }
        ReportType::Custom => "Address the report title directly.",
    };
    format!(
        "You write reports for construction professionals from their project documents. \
         {} Use markdown headings. Cite document names for every requirement. \
         Do not invent requirements that are not in the sources.",
        focus
    )
}
