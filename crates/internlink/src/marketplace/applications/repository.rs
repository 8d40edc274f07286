use serde::Serialize;

use super::domain::{Application, ApplicationId};
use crate::marketplace::accounts::UserId;
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::postings::PostingId;
use crate::marketplace::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, application: Application) -> Result<Application, RepositoryError>;
    fn update(&self, application: Application) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<Application>, RepositoryError>;
    /// Withdrawals remove the record outright.
    fn delete(&self, id: &ApplicationId) -> Result<(), RepositoryError>;
    fn find_for_student(
        &self,
        student: &UserId,
        posting: &PostingId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// A student's applications ordered newest first.
    fn for_student(
        &self,
        student: &UserId,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError>;
    /// A posting's applications ordered newest first.
    fn for_posting(
        &self,
        posting: &PostingId,
        page: PageRequest,
    ) -> Result<Page<Application>, RepositoryError>;
    /// Applications still awaiting a decision, used for close fan-out.
    fn active_for_posting(
        &self,
        posting: &PostingId,
    ) -> Result<Vec<Application>, RepositoryError>;
    fn status_counts(&self) -> Result<Vec<StatusCount>, RepositoryError>;
}

/// Per-status application totals for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status: &'static str,
    pub total: usize,
}
