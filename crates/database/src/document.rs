//! Document persistence. Every read and write is scoped by owning user.

use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::chunk;
use crate::error::{DatabaseError, Result};
use crate::models::{
    Document, DocumentMetadata, DocumentType, NewChunk, NewDocument, ProcessingStatus,
};

const SELECT_DOCUMENT: &str = r#"
    SELECT id, user_id, file_name, file_type, document_type, file_size,
           storage_key, storage_url, extracted_text, page_count, status,
           metadata, created_at, updated_at
    FROM documents
"#;

/// Insert a new document in the `pending` state.
pub async fn create_document(pool: &SqlitePool, doc: &NewDocument) -> Result<Document> {
    let id = uuid::Uuid::new_v4().to_string();

    sqlx::query(
        r#"
        INSERT INTO documents (
            id, user_id, file_name, file_type, document_type, file_size,
            storage_key, storage_url, status, metadata
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&doc.user_id)
    .bind(&doc.file_name)
    .bind(&doc.file_type)
    .bind(doc.document_type)
    .bind(doc.file_size)
    .bind(&doc.storage_key)
    .bind(&doc.storage_url)
    .bind(ProcessingStatus::Pending)
    .bind(Json(&doc.metadata))
    .execute(pool)
    .await?;

    get_document(pool, &id, &doc.user_id).await
}

/// Get a document owned by `user_id`.
pub async fn get_document(pool: &SqlitePool, id: &str, user_id: &str) -> Result<Document> {
    let sql = format!("{SELECT_DOCUMENT} WHERE id = ? AND user_id = ?");
    sqlx::query_as::<_, Document>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Document", id))
}

/// List a user's documents, newest first.
///
/// `document_types` restricts the result to those classifications. `None` or
/// an empty slice applies no filter.
pub async fn list_documents(
    pool: &SqlitePool,
    user_id: &str,
    document_types: Option<&[DocumentType]>,
) -> Result<Vec<Document>> {
    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_DOCUMENT);
    qb.push(" WHERE user_id = ");
    qb.push_bind(user_id);

    if let Some(types) = document_types.filter(|t| !t.is_empty()) {
        qb.push(" AND document_type IN (");
        let mut separated = qb.separated(", ");
        for doc_type in types {
            separated.push_bind(*doc_type);
        }
        separated.push_unseparated(")");
    }

    qb.push(" ORDER BY created_at DESC, rowid DESC");

    let docs = qb.build_query_as::<Document>().fetch_all(pool).await?;
    Ok(docs)
}

/// List a user's documents that finished processing, newest first.
pub async fn list_completed_documents(pool: &SqlitePool, user_id: &str) -> Result<Vec<Document>> {
    let sql = format!(
        "{SELECT_DOCUMENT} WHERE user_id = ? AND status = ? ORDER BY created_at DESC, rowid DESC"
    );
    let docs = sqlx::query_as::<_, Document>(&sql)
        .bind(user_id)
        .bind(ProcessingStatus::Completed)
        .fetch_all(pool)
        .await?;
    Ok(docs)
}

/// Move a document into `processing`.
pub async fn mark_processing(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    set_status(pool, id, user_id, ProcessingStatus::Processing).await
}

/// Move a document into `failed`. Extracted text is left untouched.
pub async fn mark_failed(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    set_status(pool, id, user_id, ProcessingStatus::Failed).await
}

/// Store extraction results and move the document into `completed`.
pub async fn mark_completed(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    extracted_text: &str,
    page_count: i64,
    metadata: &DocumentMetadata,
) -> Result<()> {
    let mut conn = pool.acquire().await?;
    set_completed(&mut *conn, id, user_id, extracted_text, page_count, metadata).await
}

/// Store the chunks and the extraction results in one transaction.
///
/// The document only becomes `completed` together with its chunks; on any
/// error neither is written.
pub async fn complete_with_chunks(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    extracted_text: &str,
    page_count: i64,
    metadata: &DocumentMetadata,
    chunks: &[NewChunk],
) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let inserted = chunk::insert_chunk_rows(&mut *tx, chunks).await?;
    set_completed(&mut *tx, id, user_id, extracted_text, page_count, metadata).await?;
    tx.commit().await?;
    Ok(inserted)
}

async fn set_completed(
    conn: &mut SqliteConnection,
    id: &str,
    user_id: &str,
    extracted_text: &str,
    page_count: i64,
    metadata: &DocumentMetadata,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET extracted_text = ?,
            page_count = ?,
            metadata = ?,
            status = ?,
            updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(extracted_text)
    .bind(page_count)
    .bind(Json(metadata))
    .bind(ProcessingStatus::Completed)
    .bind(id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Document", id));
    }

    Ok(())
}

async fn set_status(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    status: ProcessingStatus,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET status = ?, updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(status)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Document", id));
    }

    tracing::debug!(document_id = %id, status = %status, "Document status updated");
    Ok(())
}

/// Delete a document owned by `user_id`. Its chunks go with it.
pub async fn delete_document(pool: &SqlitePool, id: &str, user_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM documents
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Document", id));
    }

    Ok(())
}
