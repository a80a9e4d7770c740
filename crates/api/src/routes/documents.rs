//! Document routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use database::{chunk, document, Document, DocumentChunk, DocumentType};
use documents::UploadRequest;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Upload body. The file travels base64-encoded.
#[derive(Deserialize)]
pub struct UploadBody {
    pub file_name: String,
    #[serde(default)]
    pub mime_type: String,
    pub document_type: DocumentType,
    pub content_base64: String,
}

/// `?document_type=specifications,cpm_schedule`
#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub document_type: Option<String>,
}

/// Store an upload; processing continues after the response.
pub async fn upload(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<UploadBody>,
) -> Result<(StatusCode, Json<Document>)> {
    let bytes = STANDARD
        .decode(body.content_base64.trim())
        .map_err(|e| ApiError::BadRequest(format!("content_base64 is not valid base64: {}", e)))?;

    let doc = state
        .documents
        .upload(UploadRequest {
            user_id,
            file_name: body.file_name,
            mime_type: body.mime_type,
            document_type: body.document_type,
            bytes,
        })
        .await?;

    Ok((StatusCode::ACCEPTED, Json(doc)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Document>>> {
    let types = parse_types(query.document_type.as_deref())?;
    let docs = document::list_documents(state.db.pool(), &user_id, types.as_deref()).await?;
    Ok(Json(docs))
}

pub async fn get(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Document>> {
    Ok(Json(
        document::get_document(state.db.pool(), &id, &user_id).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.documents.delete(&user_id, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn chunks(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<DocumentChunk>>> {
    // 404 for documents the caller does not own
    document::get_document(state.db.pool(), &id, &user_id).await?;
    Ok(Json(
        chunk::list_document_chunks(state.db.pool(), &id, &user_id).await?,
    ))
}

/// Comma-separated document types; `None` or blank means no filter.
fn parse_types(raw: Option<&str>) -> Result<Option<Vec<DocumentType>>> {
    let Some(raw) = raw.map(str::trim).filter(|r| !r.is_empty()) else {
        return Ok(None);
    };
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<DocumentType>().map_err(ApiError::BadRequest))
        .collect::<Result<Vec<_>>>()
        .map(Some)
}
