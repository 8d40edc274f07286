use super::domain::{Job, JobFilter, JobId};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

/// Storage abstraction for board listings.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn delete(&self, id: &JobId) -> Result<(), RepositoryError>;
    /// Matching jobs ordered newest first.
    fn search(&self, filter: &JobFilter, page: PageRequest) -> Result<Page<Job>, RepositoryError>;
}
