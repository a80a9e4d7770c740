//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;

/// A registered user. Every other row is owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: String,
}

/// Classification of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DocumentType {
    ProjectPlans,
    Specifications,
    StandardPlans,
    SpecialProvisions,
    CpmSchedule,
    Other,
}

impl DocumentType {
    pub const ALL: [DocumentType; 6] = [
        DocumentType::ProjectPlans,
        DocumentType::Specifications,
        DocumentType::StandardPlans,
        DocumentType::SpecialProvisions,
        DocumentType::CpmSchedule,
        DocumentType::Other,
    ];

    /// Stored identifier.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::ProjectPlans => "project_plans",
            DocumentType::Specifications => "specifications",
            DocumentType::StandardPlans => "standard_plans",
            DocumentType::SpecialProvisions => "special_provisions",
            DocumentType::CpmSchedule => "cpm_schedule",
            DocumentType::Other => "other",
        }
    }

    /// Human readable label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            DocumentType::ProjectPlans => "Project Plans",
            DocumentType::Specifications => "Specifications",
            DocumentType::StandardPlans => "Standard Plans",
            DocumentType::SpecialProvisions => "Special Provisions",
            DocumentType::CpmSchedule => "CPM Schedule",
            DocumentType::Other => "Other",
        }
    }

    /// Types whose upload is announced to the owner.
    pub fn is_high_priority(&self) -> bool {
        matches!(
            self,
            DocumentType::SpecialProvisions | DocumentType::CpmSchedule
        )
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        DocumentType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown document type: {}", s))
    }
}

/// Processing lifecycle of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingStatus::Pending => "pending",
            ProcessingStatus::Processing => "processing",
            ProcessingStatus::Completed => "completed",
            ProcessingStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for ProcessingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form document metadata stored as JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub sections: Vec<String>,
    pub keywords: Vec<String>,
    /// Hex SHA-256 of the uploaded bytes.
    pub checksum: Option<String>,
}

/// An uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub user_id: String,
    pub file_name: String,
    /// MIME type declared at upload.
    pub file_type: String,
    pub document_type: DocumentType,
    pub file_size: i64,
    pub storage_key: String,
    pub storage_url: String,
    pub extracted_text: Option<String>,
    pub page_count: Option<i64>,
    pub status: ProcessingStatus,
    pub metadata: Json<DocumentMetadata>,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields supplied when a document is created.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub user_id: String,
    pub file_name: String,
    pub file_type: String,
    pub document_type: DocumentType,
    pub file_size: i64,
    pub storage_key: String,
    pub storage_url: String,
    pub metadata: DocumentMetadata,
}

/// Detected kind of chunk content, checked in declaration order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Schedule,
    Specification,
    Measurement,
    SectionHeader,
    Reference,
    #[default]
    General,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Schedule => "schedule",
            ContentType::Specification => "specification",
            ContentType::Measurement => "measurement",
            ContentType::SectionHeader => "section_header",
            ContentType::Reference => "reference",
            ContentType::General => "general",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkMetadata {
    pub keywords: Vec<String>,
    pub content_type: ContentType,
}

/// A contiguous slice of a document's extracted text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DocumentChunk {
    pub id: i64,
    pub document_id: String,
    pub user_id: String,
    pub chunk_index: i64,
    pub content: String,
    pub page_number: Option<i64>,
    pub section_title: Option<String>,
    pub start_offset: Option<i64>,
    pub end_offset: Option<i64>,
    pub metadata: Json<ChunkMetadata>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewChunk {
    pub document_id: String,
    pub user_id: String,
    pub chunk_index: i64,
    pub content: String,
    pub page_number: Option<i64>,
    pub section_title: Option<String>,
    pub start_offset: Option<i64>,
    pub end_offset: Option<i64>,
    pub metadata: ChunkMetadata,
}

/// A chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Conversation {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub document_ids: Json<Vec<String>>,
    pub last_message_at: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

/// Pointer from an answer back to its supporting document text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub document_id: String,
    pub document_name: String,
    pub page_number: Option<i64>,
    pub section_title: Option<String>,
    pub excerpt: String,
}

/// Audit record of one tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub tool_name: String,
    pub input: Value,
    pub output: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageMetadata {
    pub model: Option<String>,
    pub token_count: Option<u32>,
    pub latency_ms: Option<u64>,
}

/// A message within a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: String,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub citations: Json<Vec<Citation>>,
    pub tool_calls: Json<Vec<ToolCallResult>>,
    pub metadata: Json<MessageMetadata>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub conversation_id: String,
    pub user_id: String,
    pub role: MessageRole,
    pub content: String,
    pub citations: Vec<Citation>,
    pub tool_calls: Vec<ToolCallResult>,
    pub metadata: MessageMetadata,
}

impl NewMessage {
    /// A message with no citations, tool calls or metadata.
    pub fn plain(
        conversation_id: impl Into<String>,
        user_id: impl Into<String>,
        role: MessageRole,
        content: impl Into<String>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            user_id: user_id.into(),
            role,
            content: content.into(),
            citations: Vec::new(),
            tool_calls: Vec::new(),
            metadata: MessageMetadata::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ReportType {
    Summary,
    SpecificationReview,
    ScheduleAnalysis,
    ConflictAnalysis,
    QuantityTakeoff,
    Custom,
}

impl ReportType {
    pub const ALL: [ReportType; 6] = [
        ReportType::Summary,
        ReportType::SpecificationReview,
        ReportType::ScheduleAnalysis,
        ReportType::ConflictAnalysis,
        ReportType::QuantityTakeoff,
        ReportType::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Summary => "summary",
            ReportType::SpecificationReview => "specification_review",
            ReportType::ScheduleAnalysis => "schedule_analysis",
            ReportType::ConflictAnalysis => "conflict_analysis",
            ReportType::QuantityTakeoff => "quantity_takeoff",
            ReportType::Custom => "custom",
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown report type: {}", s))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportMetadata {
    pub document_names: Vec<String>,
    pub model: Option<String>,
}

/// A generated report. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Report {
    pub id: String,
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub title: String,
    pub report_type: ReportType,
    pub content: String,
    pub source_document_ids: Json<Vec<String>>,
    pub metadata: Json<ReportMetadata>,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub user_id: String,
    pub conversation_id: Option<String>,
    pub title: String,
    pub report_type: ReportType,
    pub content: String,
    pub source_document_ids: Vec<String>,
    pub metadata: ReportMetadata,
}
