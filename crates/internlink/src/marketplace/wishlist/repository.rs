use super::domain::{WishlistItem, WishlistItemId};
use crate::marketplace::accounts::UserId;
use crate::marketplace::postings::PostingId;
use crate::marketplace::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait WishlistRepository: Send + Sync {
    fn insert(&self, item: WishlistItem) -> Result<WishlistItem, RepositoryError>;
    fn update(&self, item: WishlistItem) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &WishlistItemId) -> Result<Option<WishlistItem>, RepositoryError>;
    fn delete(&self, id: &WishlistItemId) -> Result<(), RepositoryError>;
    fn find_for_student(
        &self,
        student: &UserId,
        posting: &PostingId,
    ) -> Result<Option<WishlistItem>, RepositoryError>;
    fn for_student(&self, student: &UserId) -> Result<Vec<WishlistItem>, RepositoryError>;
    /// Every stored item, for the reminder sweep.
    fn all(&self) -> Result<Vec<WishlistItem>, RepositoryError>;
}
