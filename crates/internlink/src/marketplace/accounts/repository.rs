use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{Session, UserAccount, UserId, UserRole};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait AccountRepository: Send + Sync {
    fn insert(&self, account: UserAccount) -> Result<UserAccount, RepositoryError>;
    fn update(&self, account: UserAccount) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &UserId) -> Result<Option<UserAccount>, RepositoryError>;
    fn fetch_by_email(&self, email: &str) -> Result<Option<UserAccount>, RepositoryError>;
    /// Accounts ordered newest first, optionally narrowed to one role.
    fn list(
        &self,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<Page<UserAccount>, RepositoryError>;
    fn role_breakdown(&self) -> Result<Vec<RoleCount>, RepositoryError>;
}

/// Per-role account totals for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleCount {
    pub role: &'static str,
    pub total: usize,
    pub active: usize,
}

/// Storage for opaque login sessions.
pub trait SessionStore: Send + Sync {
    fn insert(&self, session: Session) -> Result<(), RepositoryError>;
    fn fetch(&self, token: &str) -> Result<Option<Session>, RepositoryError>;
    /// Removing an unknown token is a no-op so logout stays idempotent.
    fn revoke(&self, token: &str) -> Result<(), RepositoryError>;
    fn revoke_for_user(&self, user: &UserId) -> Result<usize, RepositoryError>;
    fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, RepositoryError>;
}
