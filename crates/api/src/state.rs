//! Application state shared across handlers.

use agent::{ChatService, ReportGenerator};
use database::Database;
use documents::DocumentService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Database,
    /// Upload and deletion of documents.
    pub documents: DocumentService,
    /// Agent-backed chat turns.
    pub chat: ChatService,
    /// Report generation.
    pub reports: ReportGenerator,
    /// Bearer token required on API routes, if any.
    pub api_token: Option<String>,
}
