//! Upload and deletion of user documents.

use std::sync::Arc;

use assistant_core::{notify_detached, sha256_hex, BlobStore, Notification, OwnerNotifier};
use database::{document, user, Database, Document, DocumentMetadata, DocumentType, NewDocument};
use tracing::{info, warn};

use crate::error::{ProcessingError, Result};
use crate::file_kind::FileKind;
use crate::processor::DocumentProcessor;

/// Default cap on upload size: 50 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// A file handed over by a user.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub user_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub document_type: DocumentType,
    pub bytes: Vec<u8>,
}

/// Accepts uploads, stores the bytes and starts detached processing.
#[derive(Clone)]
pub struct DocumentService {
    database: Database,
    blobs: Arc<dyn BlobStore>,
    processor: DocumentProcessor,
    notifier: Arc<dyn OwnerNotifier>,
    max_upload_bytes: usize,
}

impl DocumentService {
    pub fn new(
        database: Database,
        blobs: Arc<dyn BlobStore>,
        processor: DocumentProcessor,
        notifier: Arc<dyn OwnerNotifier>,
    ) -> Self {
        Self {
            database,
            blobs,
            processor,
            notifier,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    /// Store an upload and return the `pending` document.
    ///
    /// Processing runs on a background task; the returned document does not
    /// reflect its outcome.
    pub async fn upload(&self, request: UploadRequest) -> Result<Document> {
        let kind = FileKind::detect(&request.mime_type, &request.file_name)
            .ok_or_else(|| ProcessingError::UnsupportedFileType(request.mime_type.clone()))?;

        let file_name = sanitize_file_name(&request.file_name);
        if file_name.is_empty() {
            return Err(ProcessingError::InvalidUpload("file name is empty".to_string()));
        }
        if request.bytes.is_empty() {
            return Err(ProcessingError::InvalidUpload("file is empty".to_string()));
        }
        if request.bytes.len() > self.max_upload_bytes {
            return Err(ProcessingError::InvalidUpload(format!(
                "file is {} bytes, limit is {}",
                request.bytes.len(),
                self.max_upload_bytes
            )));
        }

        let mime_type = if request.mime_type.trim().is_empty() {
            kind.mime_type().to_string()
        } else {
            request.mime_type.clone()
        };

        user::ensure_user(self.database.pool(), &request.user_id).await?;

        let checksum = sha256_hex(&request.bytes);
        let file_size = request.bytes.len() as i64;
        let key = format!(
            "{}/documents/{}-{}",
            request.user_id,
            uuid::Uuid::new_v4(),
            file_name
        );
        let stored = self.blobs.put(&key, request.bytes, &mime_type).await?;

        let created = document::create_document(
            self.database.pool(),
            &NewDocument {
                user_id: request.user_id.clone(),
                file_name: request.file_name.clone(),
                file_type: mime_type,
                document_type: request.document_type,
                file_size,
                storage_key: stored.key,
                storage_url: stored.url,
                metadata: DocumentMetadata {
                    checksum: Some(checksum),
                    ..Default::default()
                },
            },
        )
        .await;
        let doc = match created {
            Ok(doc) => doc,
            Err(e) => {
                self.remove_blob(&key).await;
                return Err(e.into());
            }
        };

        info!(
            document_id = %doc.id,
            user_id = %doc.user_id,
            document_type = %doc.document_type,
            size = file_size,
            "Document uploaded"
        );

        self.processor.spawn(doc.clone());
        self.analyze_upload(&doc);

        Ok(doc)
    }

    /// Delete a document, its chunks and its stored bytes.
    pub async fn delete(&self, user_id: &str, document_id: &str) -> Result<()> {
        let doc = document::get_document(self.database.pool(), document_id, user_id).await?;
        document::delete_document(self.database.pool(), document_id, user_id).await?;
        self.remove_blob(&doc.storage_key).await;
        info!(document_id = %document_id, user_id = %user_id, "Document deleted");
        Ok(())
    }

    async fn remove_blob(&self, key: &str) {
        if let Err(e) = self.blobs.delete(key).await {
            warn!(storage_key = %key, error = %e, "Could not remove stored blob");
        }
    }

    /// Processor used for uploads.
    pub fn processor(&self) -> &DocumentProcessor {
        &self.processor
    }

    /// Announce high-priority uploads to the owner without waiting.
    fn analyze_upload(&self, doc: &Document) {
        if !doc.document_type.is_high_priority() {
            return;
        }
        notify_detached(
            self.notifier.clone(),
            Notification::new(
                format!("New {} uploaded", doc.document_type.label()),
                format!(
                    "{} ({} bytes) was uploaded by user {} and is being processed.",
                    doc.file_name, doc.file_size, doc.user_id
                ),
            ),
        );
    }
}

/// Keep a file name usable as the last segment of a storage key.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default().trim();
    base.chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use assistant_core::{CollectingNotifier, MemoryBlobStore};
    use database::ProcessingStatus;
    use mock_llm::ScriptedModel;

    struct Setup {
        database: Database,
        blobs: Arc<MemoryBlobStore>,
        notifier: Arc<CollectingNotifier>,
        service: DocumentService,
    }

    async fn setup() -> Setup {
        let database = Database::in_memory().await.unwrap();
        let blobs = Arc::new(MemoryBlobStore::new());
        let notifier = Arc::new(CollectingNotifier::new());
        let processor = DocumentProcessor::new(
            database.clone(),
            blobs.clone(),
            Arc::new(ScriptedModel::new()),
        );
        let service =
            DocumentService::new(database.clone(), blobs.clone(), processor, notifier.clone());
        Setup {
            database,
            blobs,
            notifier,
            service,
        }
    }

    fn text_upload(document_type: DocumentType) -> UploadRequest {
        UploadRequest {
            user_id: "u1".to_string(),
            file_name: "concrete spec.txt".to_string(),
            mime_type: "text/plain".to_string(),
            document_type,
            bytes: b"Concrete shall have minimum compressive strength of 4000 psi.".to_vec(),
        }
    }

    async fn wait_for_status(setup: &Setup, doc: &Document) -> ProcessingStatus {
        for _ in 0..100 {
            let current = document::get_document(setup.database.pool(), &doc.id, &doc.user_id)
                .await
                .unwrap();
            if matches!(
                current.status,
                ProcessingStatus::Completed | ProcessingStatus::Failed
            ) {
                return current.status;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("document {} never finished processing", doc.id);
    }

    #[tokio::test]
    async fn test_upload_returns_pending_and_processes() {
        let setup = setup().await;
        let doc = setup
            .service
            .upload(text_upload(DocumentType::Specifications))
            .await
            .unwrap();

        assert_eq!(doc.status, ProcessingStatus::Pending);
        assert_eq!(doc.file_name, "concrete spec.txt");
        assert!(doc.storage_key.starts_with("u1/documents/"));
        assert!(doc.storage_key.ends_with("-concrete_spec.txt"));
        assert_eq!(
            doc.metadata.checksum.as_deref(),
            Some(sha256_hex(&text_upload(DocumentType::Other).bytes).as_str())
        );
        assert_eq!(setup.blobs.len().await, 1);

        assert_eq!(wait_for_status(&setup, &doc).await, ProcessingStatus::Completed);
    }

    #[tokio::test]
    async fn test_high_priority_upload_notifies_owner() {
        let setup = setup().await;
        setup
            .service
            .upload(text_upload(DocumentType::CpmSchedule))
            .await
            .unwrap();

        let mut sent = Vec::new();
        for _ in 0..100 {
            sent = setup.notifier.sent().await;
            if !sent.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, "New CPM Schedule uploaded");
    }

    #[tokio::test]
    async fn test_regular_upload_does_not_notify() {
        let setup = setup().await;
        let doc = setup
            .service
            .upload(text_upload(DocumentType::Specifications))
            .await
            .unwrap();
        wait_for_status(&setup, &doc).await;
        assert!(setup.notifier.sent().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_invalid_uploads() {
        let setup = setup().await;

        let mut image = text_upload(DocumentType::Other);
        image.file_name = "site.jpg".to_string();
        image.mime_type = "image/jpeg".to_string();
        assert!(matches!(
            setup.service.upload(image).await,
            Err(ProcessingError::UnsupportedFileType(_))
        ));

        let mut empty = text_upload(DocumentType::Other);
        empty.bytes.clear();
        assert!(matches!(
            setup.service.upload(empty).await,
            Err(ProcessingError::InvalidUpload(_))
        ));

        let small = setup.service.clone().with_max_upload_bytes(8);
        assert!(matches!(
            small.upload(text_upload(DocumentType::Other)).await,
            Err(ProcessingError::InvalidUpload(_))
        ));

        assert!(setup.blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_delete_is_scoped_to_owner() {
        let setup = setup().await;
        let doc = setup
            .service
            .upload(text_upload(DocumentType::Other))
            .await
            .unwrap();
        wait_for_status(&setup, &doc).await;

        let other = setup.service.delete("u2", &doc.id).await;
        assert!(matches!(other, Err(ProcessingError::Database(_))));

        setup.service.delete("u1", &doc.id).await.unwrap();
        assert!(document::get_document(setup.database.pool(), &doc.id, "u1")
            .await
            .is_err());
        assert!(setup.blobs.is_empty().await);
    }

    #[tokio::test]
    async fn test_failed_insert_removes_blob() {
        let setup = setup().await;
        sqlx::query(
            r#"
            CREATE TRIGGER reject_documents
            BEFORE INSERT ON documents
            BEGIN
                SELECT RAISE(ABORT, 'disk I/O error');
            END
            "#,
        )
        .execute(setup.database.pool())
        .await
        .unwrap();

        let result = setup
            .service
            .upload(text_upload(DocumentType::Specifications))
            .await;
        assert!(matches!(result, Err(ProcessingError::Database(_))));
        assert!(setup.blobs.is_empty().await);
        assert!(document::list_documents(setup.database.pool(), "u1", None)
            .await
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\plans\\Sheet 1.pdf"), "Sheet_1.pdf");
        assert_eq!(sanitize_file_name(".."), "");
    }
}
