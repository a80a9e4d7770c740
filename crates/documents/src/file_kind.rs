//! Recognized upload formats.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileKind {
    Pdf,
    Word,
    Text,
}

impl FileKind {
    /// Detect the kind from the declared MIME type, falling back to the file
    /// extension when the MIME type is generic or missing.
    pub fn detect(mime_type: &str, file_name: &str) -> Option<FileKind> {
        let mime = mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        match mime.as_str() {
            "application/pdf" => return Some(FileKind::Pdf),
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                return Some(FileKind::Word)
            }
            "text/plain" | "text/markdown" | "text/csv" => return Some(FileKind::Text),
            _ => {}
        }

        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())?;
        match extension.as_str() {
            "pdf" => Some(FileKind::Pdf),
            "doc" | "docx" => Some(FileKind::Word),
            "txt" | "md" | "csv" => Some(FileKind::Text),
            _ => None,
        }
    }

    /// Whether text is obtained by sending the file to the language model.
    pub fn needs_model_extraction(&self) -> bool {
        matches!(self, FileKind::Pdf | FileKind::Word)
    }

    /// Canonical MIME type for the kind.
    pub fn mime_type(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Word => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            FileKind::Text => "text/plain",
        }
    }
}
