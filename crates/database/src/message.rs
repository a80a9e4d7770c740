//! Message persistence. Messages are append-only.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Message, NewMessage};

/// Append a message to a conversation owned by the same user.
pub async fn create_message(pool: &SqlitePool, message: &NewMessage) -> Result<Message> {
    let result = sqlx::query(
        r#"
        INSERT INTO messages (
            conversation_id, user_id, role, content, citations, tool_calls, metadata
        )
        SELECT id, user_id, ?, ?, ?, ?, ?
        FROM conversations
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(message.role)
    .bind(&message.content)
    .bind(Json(&message.citations))
    .bind(Json(&message.tool_calls))
    .bind(Json(&message.metadata))
    .bind(&message.conversation_id)
    .bind(&message.user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found(
            "Conversation",
            message.conversation_id.as_str(),
        ));
    }

    get_message(pool, result.last_insert_rowid(), &message.user_id).await
}

/// Get a single message owned by `user_id`.
pub async fn get_message(pool: &SqlitePool, id: i64, user_id: &str) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, user_id, role, content, citations, tool_calls,
               metadata, created_at
        FROM messages
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Message", id.to_string()))
}

/// List all messages of a conversation, oldest first.
pub async fn list_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, user_id, role, content, citations, tool_calls,
               metadata, created_at
        FROM messages
        WHERE conversation_id = ? AND user_id = ?
        ORDER BY id
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// The last `limit` messages of a conversation, oldest first.
pub async fn list_recent_messages(
    pool: &SqlitePool,
    conversation_id: &str,
    user_id: &str,
    limit: i64,
) -> Result<Vec<Message>> {
    let mut rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, conversation_id, user_id, role, content, citations, tool_calls,
               metadata, created_at
        FROM messages
        WHERE conversation_id = ? AND user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(conversation_id)
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.reverse();
    Ok(rows)
}
