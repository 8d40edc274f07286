//! Uploaded files (resumes, transcripts) referenced by applications.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;
pub mod store;

pub use domain::{DocumentCategory, DocumentId, DocumentView, StoredDocument};
pub use repository::DocumentRepository;
pub use router::document_router;
pub use service::{DocumentError, DocumentService};
pub use store::{DiskDocumentStore, DocumentStore, DocumentStoreError};
