use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{sanitize_file_name, DocumentCategory, DocumentId, StoredDocument};
use super::repository::DocumentRepository;
use super::store::{DocumentStore, DocumentStoreError};
use crate::marketplace::accounts::{AuthenticatedUser, UserRole};
use crate::marketplace::repository::RepositoryError;

static DOCUMENT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_document_id() -> DocumentId {
    let id = DOCUMENT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    DocumentId(format!("doc-{id:06}"))
}

/// Service pairing document metadata with the byte store behind it.
pub struct DocumentService<R, S> {
    repository: Arc<R>,
    store: Arc<S>,
    max_bytes: usize,
}

impl<R, S> DocumentService<R, S>
where
    R: DocumentRepository + 'static,
    S: DocumentStore + 'static,
{
    pub fn new(repository: Arc<R>, store: Arc<S>, max_bytes: usize) -> Self {
        Self {
            repository,
            store,
            max_bytes,
        }
    }

    /// The per-upload size cap in bytes, as configured.
    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Accept an upload for the calling user. The name is reduced to a safe
    /// slug before it becomes part of the storage key, and a missing content
    /// type is guessed from the file extension.
    pub fn upload(
        &self,
        owner: &AuthenticatedUser,
        file_name: &str,
        category: DocumentCategory,
        content_type: Option<String>,
        bytes: Vec<u8>,
    ) -> Result<StoredDocument, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::EmptyUpload);
        }
        if bytes.len() > self.max_bytes {
            return Err(DocumentError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let file_name = sanitize_file_name(file_name);
        let content_type = content_type
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| {
                mime_guess::from_path(&file_name)
                    .first_or_octet_stream()
                    .to_string()
            });

        let id = next_document_id();
        let storage_key = format!("{}/{}-{}", owner.id.0, id.0, file_name);
        self.store.put(&storage_key, &bytes)?;

        let document = StoredDocument {
            id,
            owner: owner.id.clone(),
            file_name,
            category,
            content_type,
            byte_size: bytes.len(),
            storage_key,
            uploaded_at: Utc::now(),
        };
        let stored = self.repository.insert(document)?;
        Ok(stored)
    }

    /// Read a document back. Only the owner and admins may fetch it; to
    /// anyone else the id behaves as if it does not exist.
    pub fn fetch(
        &self,
        requester: &AuthenticatedUser,
        id: &DocumentId,
    ) -> Result<(StoredDocument, Vec<u8>), DocumentError> {
        let document = self.repository.fetch(id)?.ok_or(DocumentError::NotFound)?;
        if document.owner != requester.id && requester.role != UserRole::Admin {
            return Err(DocumentError::NotFound);
        }
        let bytes = self.store.get(&document.storage_key)?;
        Ok((document, bytes))
    }

    /// The caller's own uploads, newest first.
    pub fn list(&self, owner: &AuthenticatedUser) -> Result<Vec<StoredDocument>, DocumentError> {
        Ok(self.repository.for_owner(&owner.id)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("document not found")]
    NotFound,
    #[error("upload is empty")]
    EmptyUpload,
    #[error("payload too large (limit {limit} bytes)")]
    TooLarge { limit: usize },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("document storage failed: {0}")]
    Store(#[from] DocumentStoreError),
}
