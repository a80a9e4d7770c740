//! Route handlers for the HTTP API.

pub mod conversations;
pub mod documents;
pub mod health;
pub mod reports;
pub mod search;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Documents
        .route("/api/documents", get(documents::list).post(documents::upload))
        .route(
            "/api/documents/:id",
            get(documents::get).delete(documents::delete),
        )
        .route("/api/documents/:id/chunks", get(documents::chunks))
        // Retrieval and calculation
        .route("/api/search", post(search::search))
        .route("/api/calculate", post(search::calculate_quantity))
        // Conversations and chat
        .route(
            "/api/conversations",
            get(conversations::list).post(conversations::create),
        )
        .route(
            "/api/conversations/:id",
            axum::routing::patch(conversations::rename).delete(conversations::delete),
        )
        .route("/api/conversations/:id/messages", get(conversations::messages))
        .route("/api/chat", post(conversations::chat))
        // Reports
        .route("/api/reports", get(reports::list).post(reports::generate))
        .route("/api/reports/:id", get(reports::get))
}
