//! Conversation persistence.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::document;
use crate::error::{DatabaseError, Result};
use crate::models::Conversation;

/// Create a conversation owned by `user_id`.
///
/// Every linked document must belong to the same user.
pub async fn create_conversation(
    pool: &SqlitePool,
    user_id: &str,
    title: &str,
    document_ids: &[String],
) -> Result<Conversation> {
    let title = validate_title(title)?;
    for document_id in document_ids {
        document::get_document(pool, document_id, user_id).await?;
    }

    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO conversations (id, user_id, title, document_ids)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(title)
    .bind(Json(document_ids))
    .execute(pool)
    .await?;

    get_conversation(pool, &id, user_id).await
}

/// Get a conversation owned by `user_id`.
pub async fn get_conversation(pool: &SqlitePool, id: &str, user_id: &str) -> Result<Conversation> {
    sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, user_id, title, document_ids, last_message_at, created_at
        FROM conversations
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Conversation", id))
}

/// List a user's conversations, most recently active first.
pub async fn list_conversations(pool: &SqlitePool, user_id: &str) -> Result<Vec<Conversation>> {
    let rows = sqlx::query_as::<_, Conversation>(
        r#"
        SELECT id, user_id, title, document_ids, last_message_at, created_at
        FROM conversations
        WHERE user_id = ?
        ORDER BY last_message_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Rename a conversation.
pub async fn rename_conversation(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    title: &str,
) -> Result<()> {
    let title = validate_title(title)?;
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET title = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(title)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Conversation", id));
    }

    Ok(())
}

/// Bump the last-message timestamp to now.
pub async fn touch_conversation(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE conversations
        SET last_message_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Conversation", id));
    }

    Ok(())
}

/// Delete a conversation and its messages.
pub async fn delete_conversation(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM conversations
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Conversation", id));
    }

    Ok(())
}

fn validate_title(title: &str) -> Result<&str> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DatabaseError::Invalid {
            field: "title",
            reason: "cannot be empty".to_string(),
        });
    }
    Ok(title)
}
