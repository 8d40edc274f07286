use super::domain::{DocumentId, StoredDocument};
use crate::marketplace::accounts::UserId;
use crate::marketplace::repository::RepositoryError;

/// Metadata storage for uploads; the payload bytes live in a
/// [`DocumentStore`](super::store::DocumentStore) keyed by `storage_key`.
pub trait DocumentRepository: Send + Sync {
    fn insert(&self, document: StoredDocument) -> Result<StoredDocument, RepositoryError>;
    fn fetch(&self, id: &DocumentId) -> Result<Option<StoredDocument>, RepositoryError>;
    /// An owner's documents ordered newest first.
    fn for_owner(&self, owner: &UserId) -> Result<Vec<StoredDocument>, RepositoryError>;
}
