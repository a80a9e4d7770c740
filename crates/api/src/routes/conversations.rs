//! Conversation and chat routes.

use agent::ChatTurn;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::{conversation, message, user, Conversation, Message};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBody {
    pub title: String,
    #[serde(default)]
    pub document_ids: Vec<String>,
}

#[derive(Deserialize)]
pub struct RenameBody {
    pub title: String,
}

#[derive(Deserialize)]
pub struct ChatBody {
    #[serde(default)]
    pub conversation_id: Option<String>,
    pub message: String,
}

pub async fn create(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<Conversation>)> {
    user::ensure_user(state.db.pool(), &user_id).await?;
    let created = conversation::create_conversation(
        state.db.pool(),
        &user_id,
        &body.title,
        &body.document_ids,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<Vec<Conversation>>> {
    Ok(Json(
        conversation::list_conversations(state.db.pool(), &user_id).await?,
    ))
}

pub async fn rename(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<RenameBody>,
) -> Result<Json<Conversation>> {
    let pool = state.db.pool();
    conversation::rename_conversation(pool, &id, &user_id, &body.title).await?;
    Ok(Json(
        conversation::get_conversation(pool, &id, &user_id).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    conversation::delete_conversation(state.db.pool(), &id, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn messages(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    let pool = state.db.pool();
    conversation::get_conversation(pool, &id, &user_id).await?;
    Ok(Json(message::list_messages(pool, &id, &user_id).await?))
}

pub async fn chat(
    State(state): State<AppState>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatTurn>> {
    let turn = state
        .chat
        .send_message(&user_id, body.conversation_id.as_deref(), &body.message)
        .await?;
    Ok(Json(turn))
}
