//! Document chunk persistence.

use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::models::{DocumentChunk, NewChunk};

const SELECT_CHUNK: &str = r#"
    SELECT id, document_id, user_id, chunk_index, content, page_number,
           section_title, start_offset, end_offset, metadata, created_at
    FROM document_chunks
"#;

/// Insert all chunks of a document in a single transaction.
///
/// Either every chunk is stored or none is.
pub async fn insert_chunks(pool: &SqlitePool, chunks: &[NewChunk]) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let inserted = insert_chunk_rows(&mut *tx, chunks).await?;
    tx.commit().await?;
    Ok(inserted)
}

/// Insert chunks on an open connection or transaction.
pub(crate) async fn insert_chunk_rows(
    conn: &mut SqliteConnection,
    chunks: &[NewChunk],
) -> Result<u64> {
    let mut inserted = 0;

    for chunk in chunks {
        let result = sqlx::query(
            r#"
            INSERT INTO document_chunks (
                document_id, user_id, chunk_index, content, page_number,
                section_title, start_offset, end_offset, metadata
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&chunk.document_id)
        .bind(&chunk.user_id)
        .bind(chunk.chunk_index)
        .bind(&chunk.content)
        .bind(chunk.page_number)
        .bind(&chunk.section_title)
        .bind(chunk.start_offset)
        .bind(chunk.end_offset)
        .bind(Json(&chunk.metadata))
        .execute(&mut *conn)
        .await?;
        inserted += result.rows_affected();
    }

    Ok(inserted)
}

/// List the chunks of one document in index order.
pub async fn list_document_chunks(
    pool: &SqlitePool,
    document_id: &str,
    user_id: &str,
) -> Result<Vec<DocumentChunk>> {
    let sql = format!("{SELECT_CHUNK} WHERE document_id = ? AND user_id = ? ORDER BY chunk_index");
    let chunks = sqlx::query_as::<_, DocumentChunk>(&sql)
        .bind(document_id)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(chunks)
}

/// List a user's chunks in storage order, optionally restricted to some documents.
///
/// An empty `document_ids` slice yields no chunks.
pub async fn list_user_chunks(
    pool: &SqlitePool,
    user_id: &str,
    document_ids: Option<&[String]>,
) -> Result<Vec<DocumentChunk>> {
    if document_ids.is_some_and(|ids| ids.is_empty()) {
        return Ok(Vec::new());
    }

    let mut qb = QueryBuilder::<Sqlite>::new(SELECT_CHUNK);
    qb.push(" WHERE user_id = ");
    qb.push_bind(user_id);

    if let Some(ids) = document_ids {
        qb.push(" AND document_id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.as_str());
        }
        separated.push_unseparated(")");
    }

    qb.push(" ORDER BY id");

    let chunks = qb.build_query_as::<DocumentChunk>().fetch_all(pool).await?;
    Ok(chunks)
}

/// Count the chunks stored for a document.
pub async fn count_chunks(pool: &SqlitePool, document_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM document_chunks WHERE document_id = ?
        "#,
    )
    .bind(document_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
