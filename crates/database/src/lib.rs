//! SQLite persistence layer for the construction document assistant.
//!
//! This crate provides async database operations for users, documents and
//! their chunks, conversations, messages and reports using SQLx with SQLite.
//! Every owned row is scoped to a user id; a row owned by somebody else is
//! reported as [`DatabaseError::NotFound`].
//!
//! # Example
//!
//! ```no_run
//! use database::{conversation, user, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:construction.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let owner = user::ensure_user(db.pool(), "site-engineer-1").await?;
//!     let convo = conversation::create_conversation(
//!         db.pool(),
//!         &owner.id,
//!         "Footing questions",
//!         &[],
//!     )
//!     .await?;
//!     println!("created {}", convo.id);
//!
//!     Ok(())
//! }
//! ```

pub mod chunk;
pub mod conversation;
pub mod document;
pub mod error;
pub mod message;
pub mod models;
pub mod report;
pub mod user;

pub use error::{DatabaseError, Result};
pub use models::{
    Citation, ChunkMetadata, ContentType, Conversation, Document, DocumentChunk,
    DocumentMetadata, DocumentType, Message, MessageMetadata, MessageRole, NewChunk,
    NewDocument, NewMessage, NewReport, ProcessingStatus, Report, ReportMetadata, ReportType,
    ToolCallResult, User,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// A migrated in-memory database on a single connection.
    ///
    /// Each SQLite in-memory connection is its own database, so the pool is
    /// capped at one connection.
    pub async fn in_memory() -> Result<Self> {
        let db = Self::connect_with_pool_size("sqlite::memory:", 1).await?;
        db.migrate().await?;
        Ok(db)
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::in_memory().await.unwrap();
        user::ensure_user(db.pool(), "alice").await.unwrap();
        user::ensure_user(db.pool(), "bob").await.unwrap();
        db
    }

    fn new_document(user_id: &str, file_name: &str, document_type: DocumentType) -> NewDocument {
        NewDocument {
            user_id: user_id.to_string(),
            file_name: file_name.to_string(),
            file_type: "text/plain".to_string(),
            document_type,
            file_size: 64,
            storage_key: format!("{}/documents/{}", user_id, file_name),
            storage_url: format!("memory://{}/documents/{}", user_id, file_name),
            metadata: DocumentMetadata::default(),
        }
    }

    fn new_chunk(doc: &Document, index: i64, content: &str) -> NewChunk {
        NewChunk {
            document_id: doc.id.clone(),
            user_id: doc.user_id.clone(),
            chunk_index: index,
            content: content.to_string(),
            page_number: Some(1),
            section_title: None,
            start_offset: Some(0),
            end_offset: Some(content.chars().count() as i64),
            metadata: ChunkMetadata::default(),
        }
    }

    #[tokio::test]
    async fn test_user_crud() {
        let db = Database::in_memory().await.unwrap();

        let created = user::create_user(db.pool(), "u1", "Alice", Some("a@example.com"))
            .await
            .unwrap();
        assert_eq!(created.name, "Alice");

        let dup = user::create_user(db.pool(), "u1", "Alice", None).await;
        assert!(matches!(dup, Err(DatabaseError::AlreadyExists { .. })));

        let ensured = user::ensure_user(db.pool(), "u1").await.unwrap();
        assert_eq!(ensured.name, "Alice");

        user::delete_user(db.pool(), "u1").await.unwrap();
        let result = user::get_user(db.pool(), "u1").await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_document_lifecycle() {
        let db = test_db().await;
        let doc = document::create_document(
            db.pool(),
            &new_document("alice", "spec.txt", DocumentType::Specifications),
        )
        .await
        .unwrap();
        assert_eq!(doc.status, ProcessingStatus::Pending);
        assert!(doc.extracted_text.is_none());

        document::mark_processing(db.pool(), &doc.id, "alice").await.unwrap();
        let meta = DocumentMetadata {
            title: Some("Concrete".to_string()),
            ..Default::default()
        };
        document::mark_completed(db.pool(), &doc.id, "alice", "text", 1, &meta)
            .await
            .unwrap();

        let fetched = document::get_document(db.pool(), &doc.id, "alice").await.unwrap();
        assert_eq!(fetched.status, ProcessingStatus::Completed);
        assert_eq!(fetched.page_count, Some(1));
        assert_eq!(fetched.metadata.title.as_deref(), Some("Concrete"));
    }

    #[tokio::test]
    async fn test_document_scoped_to_owner() {
        let db = test_db().await;
        let doc = document::create_document(
            db.pool(),
            &new_document("alice", "plans.pdf", DocumentType::ProjectPlans),
        )
        .await
        .unwrap();

        let other = document::get_document(db.pool(), &doc.id, "bob").await;
        assert!(matches!(other, Err(DatabaseError::NotFound { .. })));

        let delete = document::delete_document(db.pool(), &doc.id, "bob").await;
        assert!(delete.unwrap_err().is_not_found());

        assert!(document::list_documents(db.pool(), "bob", None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_list_documents_filters_and_orders() {
        let db = test_db().await;
        for (name, doc_type) in [
            ("a.txt", DocumentType::Specifications),
            ("b.txt", DocumentType::CpmSchedule),
            ("c.txt", DocumentType::Specifications),
        ] {
            document::create_document(db.pool(), &new_document("alice", name, doc_type))
                .await
                .unwrap();
        }

        let all = document::list_documents(db.pool(), "alice", None).await.unwrap();
        let names: Vec<_> = all.iter().map(|d| d.file_name.as_str()).collect();
        assert_eq!(names, vec!["c.txt", "b.txt", "a.txt"]);

        let specs = document::list_documents(
            db.pool(),
            "alice",
            Some(&[DocumentType::Specifications][..]),
        )
        .await
        .unwrap();
        assert_eq!(specs.len(), 2);

        let unfiltered = document::list_documents(db.pool(), "alice", Some(&[][..]))
            .await
            .unwrap();
        assert_eq!(unfiltered.len(), 3);
    }

    #[tokio::test]
    async fn test_chunks_insert_and_cascade() {
        let db = test_db().await;
        let doc = document::create_document(
            db.pool(),
            &new_document("alice", "spec.txt", DocumentType::Specifications),
        )
        .await
        .unwrap();

        let chunks = vec![
            new_chunk(&doc, 0, "first chunk"),
            new_chunk(&doc, 1, "second chunk"),
        ];
        let inserted = chunk::insert_chunks(db.pool(), &chunks).await.unwrap();
        assert_eq!(inserted, 2);

        let stored = chunk::list_document_chunks(db.pool(), &doc.id, "alice")
            .await
            .unwrap();
        assert_eq!(stored[0].chunk_index, 0);
        assert_eq!(stored[1].content, "second chunk");

        assert!(chunk::list_user_chunks(db.pool(), "bob", None)
            .await
            .unwrap()
            .is_empty());
        assert!(chunk::list_user_chunks(db.pool(), "alice", Some(&[][..]))
            .await
            .unwrap()
            .is_empty());

        document::delete_document(db.pool(), &doc.id, "alice").await.unwrap();
        assert_eq!(chunk::count_chunks(db.pool(), &doc.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_chunk_batch_is_atomic() {
        let db = test_db().await;
        let doc = document::create_document(
            db.pool(),
            &new_document("alice", "spec.txt", DocumentType::Specifications),
        )
        .await
        .unwrap();

        // Duplicate index violates the unique constraint.
        let chunks = vec![new_chunk(&doc, 0, "one"), new_chunk(&doc, 0, "two")];
        assert!(chunk::insert_chunks(db.pool(), &chunks).await.is_err());
        assert_eq!(chunk::count_chunks(db.pool(), &doc.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_complete_with_chunks() {
        let db = test_db().await;
        let doc = document::create_document(
            db.pool(),
            &new_document("alice", "spec.txt", DocumentType::Specifications),
        )
        .await
        .unwrap();
        let chunks = vec![new_chunk(&doc, 0, "first chunk"), new_chunk(&doc, 1, "second")];
        let meta = DocumentMetadata::default();

        // Status update finds no row for bob, so the chunk inserts roll back.
        let foreign =
            document::complete_with_chunks(db.pool(), &doc.id, "bob", "text", 1, &meta, &chunks)
                .await;
        assert!(foreign.unwrap_err().is_not_found());
        assert_eq!(chunk::count_chunks(db.pool(), &doc.id).await.unwrap(), 0);
        let pending = document::get_document(db.pool(), &doc.id, "alice").await.unwrap();
        assert_eq!(pending.status, ProcessingStatus::Pending);

        let inserted =
            document::complete_with_chunks(db.pool(), &doc.id, "alice", "text", 1, &meta, &chunks)
                .await
                .unwrap();
        assert_eq!(inserted, 2);
        let completed = document::get_document(db.pool(), &doc.id, "alice").await.unwrap();
        assert_eq!(completed.status, ProcessingStatus::Completed);
        assert_eq!(completed.extracted_text.as_deref(), Some("text"));
    }

    #[tokio::test]
    async fn test_conversation_documents_must_be_owned() {
        let db = test_db().await;
        let bobs = document::create_document(
            db.pool(),
            &new_document("bob", "plans.pdf", DocumentType::ProjectPlans),
        )
        .await
        .unwrap();

        for document_id in [bobs.id.as_str(), "no-such-document"] {
            let result = conversation::create_conversation(
                db.pool(),
                "alice",
                "Plans",
                &[document_id.to_string()],
            )
            .await;
            assert!(matches!(
                result,
                Err(DatabaseError::NotFound { entity: "Document", .. })
            ));
        }
        assert!(conversation::list_conversations(db.pool(), "alice")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_report_conversation_must_be_owned() {
        let db = test_db().await;
        let alices = conversation::create_conversation(db.pool(), "alice", "Q", &[])
            .await
            .unwrap();

        for conversation_id in [alices.id.as_str(), "no-such-conversation"] {
            let result = report::create_report(
                db.pool(),
                &NewReport {
                    user_id: "bob".to_string(),
                    conversation_id: Some(conversation_id.to_string()),
                    title: "Summary".to_string(),
                    report_type: ReportType::Summary,
                    content: "text".to_string(),
                    source_document_ids: Vec::new(),
                    metadata: ReportMetadata::default(),
                },
            )
            .await;
            assert!(matches!(
                result,
                Err(DatabaseError::NotFound { entity: "Conversation", .. })
            ));
        }
        assert!(report::list_reports(db.pool(), "bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_conversation_and_messages() {
        let db = test_db().await;
        let first = conversation::create_conversation(db.pool(), "alice", "First", &[])
            .await
            .unwrap();
        let doc = document::create_document(
            db.pool(),
            &new_document("alice", "spec.txt", DocumentType::Specifications),
        )
        .await
        .unwrap();
        let second = conversation::create_conversation(
            db.pool(),
            "alice",
            "Second",
            &[doc.id.clone()],
        )
        .await
        .unwrap();
        assert_eq!(second.document_ids.0, vec![doc.id.clone()]);

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        conversation::touch_conversation(db.pool(), &first.id, "alice")
            .await
            .unwrap();
        let listed = conversation::list_conversations(db.pool(), "alice").await.unwrap();
        assert_eq!(listed[0].id, first.id);

        conversation::rename_conversation(db.pool(), &first.id, "alice", "Renamed")
            .await
            .unwrap();
        let renamed = conversation::get_conversation(db.pool(), &first.id, "alice")
            .await
            .unwrap();
        assert_eq!(renamed.title, "Renamed");

        let blank = conversation::rename_conversation(db.pool(), &first.id, "alice", "  ").await;
        assert!(matches!(blank, Err(DatabaseError::Invalid { .. })));

        for (role, text) in [
            (MessageRole::User, "one"),
            (MessageRole::Assistant, "two"),
            (MessageRole::User, "three"),
        ] {
            message::create_message(db.pool(), &NewMessage::plain(&first.id, "alice", role, text))
                .await
                .unwrap();
        }

        let all = message::list_messages(db.pool(), &first.id, "alice").await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all[0].content, "one");

        let recent = message::list_recent_messages(db.pool(), &first.id, "alice", 2)
            .await
            .unwrap();
        let texts: Vec<_> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["two", "three"]);

        let foreign = message::create_message(
            db.pool(),
            &NewMessage::plain(&first.id, "bob", MessageRole::User, "hi"),
        )
        .await;
        assert!(matches!(foreign, Err(DatabaseError::NotFound { .. })));

        conversation::delete_conversation(db.pool(), &first.id, "alice")
            .await
            .unwrap();
        assert!(message::list_messages(db.pool(), &first.id, "alice")
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_message_citations_round_trip() {
        let db = test_db().await;
        let convo = conversation::create_conversation(db.pool(), "alice", "Q", &[])
            .await
            .unwrap();
        let mut new = NewMessage::plain(&convo.id, "alice", MessageRole::Assistant, "answer");
        new.citations.push(Citation {
            document_id: "d1".to_string(),
            document_name: "spec.txt".to_string(),
            page_number: Some(3),
            section_title: Some("SECTION 3".to_string()),
            excerpt: "Concrete shall...".to_string(),
        });
        new.metadata.latency_ms = Some(42);

        let stored = message::create_message(db.pool(), &new).await.unwrap();
        assert_eq!(stored.citations.0, new.citations);
        assert_eq!(stored.metadata.latency_ms, Some(42));
    }

    #[tokio::test]
    async fn test_report_survives_conversation_delete() {
        let db = test_db().await;
        let convo = conversation::create_conversation(db.pool(), "alice", "Q", &[])
            .await
            .unwrap();
        let report = report::create_report(
            db.pool(),
            &NewReport {
                user_id: "alice".to_string(),
                conversation_id: Some(convo.id.clone()),
                title: "Summary".to_string(),
                report_type: ReportType::Summary,
                content: "All good".to_string(),
                source_document_ids: vec!["d1".to_string()],
                metadata: ReportMetadata::default(),
            },
        )
        .await
        .unwrap();

        conversation::delete_conversation(db.pool(), &convo.id, "alice")
            .await
            .unwrap();

        let fetched = report::get_report(db.pool(), &report.id, "alice").await.unwrap();
        assert_eq!(fetched.conversation_id, None);
        assert_eq!(fetched.report_type, ReportType::Summary);
        assert!(report::get_report(db.pool(), &report.id, "bob").await.is_err());
        assert_eq!(report::list_reports(db.pool(), "alice").await.unwrap().len(), 1);
    }
}
