//! HTTP API for the construction document assistant.
//!
//! Wires the store, blob storage, language model and owner notifications
//! into the document, chat and report services and serves them over axum.
//! Every `/api` route is scoped to the user in the `x-user-id` header.

mod auth;
mod config;
mod error;
mod notifier;
mod routes;
mod state;

use std::env;
use std::sync::Arc;

use agent::{Agent, AgentConfig, ChatService, ReportGenerator};
use assistant_core::{
    BlobStore, LanguageModel, LocalBlobStore, LoggingNotifier, OwnerNotifier, TimeoutModel,
};
use axum::extract::DefaultBodyLimit;
use database::Database;
use documents::{DocumentProcessor, DocumentService};
use openai_llm::OpenAiModel;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::notifier::WebhookNotifier;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting construction assistant API");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let mut local = LocalBlobStore::new(config.blob_dir.clone());
    if let Some(base_url) = &config.blob_base_url {
        local = local.with_base_url(base_url.clone());
    }
    let blobs: Arc<dyn BlobStore> = Arc::new(local);

    let model: Arc<dyn LanguageModel> = Arc::new(TimeoutModel::with_secs(
        OpenAiModel::from_env()?,
        config.llm_call_timeout_secs,
    ));

    let notifier: Arc<dyn OwnerNotifier> = match &config.owner_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())?),
        None => Arc::new(LoggingNotifier),
    };

    let processor = DocumentProcessor::new(db.clone(), blobs.clone(), model.clone());
    let documents = DocumentService::new(db.clone(), blobs, processor, notifier.clone())
        .with_max_upload_bytes(config.max_upload_bytes);
    let agent = Agent::new(db.clone(), model.clone(), notifier)
        .with_config(AgentConfig::from_env());
    let chat = ChatService::new(db.clone(), agent);
    let reports = ReportGenerator::new(db.clone(), model);

    let state = AppState {
        db,
        documents,
        chat,
        reports,
        api_token: config.api_token.clone(),
    };

    // Uploads arrive base64-encoded, a third larger than the file.
    let body_limit = config.max_upload_bytes / 3 * 4 + 64 * 1024;

    let app = routes::router()
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!(addr = %config.addr, "API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` filtering (default `info`); `LOG_FORMAT=json` for JSON lines.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
