//! Report persistence. Reports are written once and never updated.

use sqlx::types::Json;
use sqlx::SqlitePool;

use crate::conversation;
use crate::error::{DatabaseError, Result};
use crate::models::{NewReport, Report};

/// Store a report. A linked conversation must belong to the same user.
pub async fn create_report(pool: &SqlitePool, report: &NewReport) -> Result<Report> {
    if let Some(conversation_id) = &report.conversation_id {
        conversation::get_conversation(pool, conversation_id, &report.user_id).await?;
    }

    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO reports (
            id, user_id, conversation_id, title, report_type, content,
            source_document_ids, metadata
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&report.user_id)
    .bind(&report.conversation_id)
    .bind(&report.title)
    .bind(report.report_type)
    .bind(&report.content)
    .bind(Json(&report.source_document_ids))
    .bind(Json(&report.metadata))
    .execute(pool)
    .await?;

    get_report(pool, &id, &report.user_id).await
}

pub async fn get_report(pool: &SqlitePool, id: &str, user_id: &str) -> Result<Report> {
    sqlx::query_as::<_, Report>(
        r#"
        SELECT id, user_id, conversation_id, title, report_type, content,
               source_document_ids, metadata, created_at
        FROM reports
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::not_found("Report", id))
}

/// List a user's reports, newest first.
pub async fn list_reports(pool: &SqlitePool, user_id: &str) -> Result<Vec<Report>> {
    let rows = sqlx::query_as::<_, Report>(
        r#"
        SELECT id, user_id, conversation_id, title, report_type, content,
               source_document_ids, metadata, created_at
        FROM reports
        WHERE user_id = ?
        ORDER BY created_at DESC, rowid DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
