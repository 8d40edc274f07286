use serde::Serialize;

use super::domain::{Posting, PostingFilter, PostingId};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait PostingRepository: Send + Sync {
    fn insert(&self, posting: Posting) -> Result<Posting, RepositoryError>;
    fn update(&self, posting: Posting) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &PostingId) -> Result<Option<Posting>, RepositoryError>;
    /// Matching postings ordered newest first.
    fn search(
        &self,
        filter: &PostingFilter,
        page: PageRequest,
    ) -> Result<Page<Posting>, RepositoryError>;
    fn status_counts(&self) -> Result<PostingStatusCounts, RepositoryError>;
    fn field_breakdown(&self) -> Result<Vec<FieldCount>, RepositoryError>;
}

/// Open/closed totals for the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PostingStatusCounts {
    pub open: usize,
    pub closed: usize,
}

/// Per-discipline posting totals for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldCount {
    pub field: &'static str,
    pub total: usize,
}
