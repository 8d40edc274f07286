use std::sync::Arc;

use serde::Serialize;

use crate::marketplace::accounts::domain::ProfileView;
use crate::marketplace::accounts::repository::{AccountRepository, RoleCount, SessionStore};
use crate::marketplace::accounts::{AuthenticatedUser, UserId, UserRole};
use crate::marketplace::applications::repository::{ApplicationRepository, StatusCount};
use crate::marketplace::notifications::repository::{NotificationRepository, NotificationTotals};
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::postings::repository::{FieldCount, PostingRepository, PostingStatusCounts};
use crate::marketplace::repository::RepositoryError;

/// Marketplace-wide counters, assembled by iterating the repositories.
#[derive(Debug, Clone, Serialize)]
pub struct MarketplaceStats {
    pub users: Vec<RoleCount>,
    pub postings: PostingStatusCounts,
    pub posting_fields: Vec<FieldCount>,
    pub applications: Vec<StatusCount>,
    pub notifications: NotificationTotals,
}

/// Operator-facing service. Every operation requires the Admin role.
pub struct AdminService<U, S, P, A, N> {
    accounts: Arc<U>,
    sessions: Arc<S>,
    postings: Arc<P>,
    applications: Arc<A>,
    notifications: Arc<N>,
}

impl<U, S, P, A, N> AdminService<U, S, P, A, N>
where
    U: AccountRepository + 'static,
    S: SessionStore + 'static,
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
{
    pub fn new(
        accounts: Arc<U>,
        sessions: Arc<S>,
        postings: Arc<P>,
        applications: Arc<A>,
        notifications: Arc<N>,
    ) -> Self {
        Self {
            accounts,
            sessions,
            postings,
            applications,
            notifications,
        }
    }

    pub fn stats(&self, actor: &AuthenticatedUser) -> Result<MarketplaceStats, AdminError> {
        require_admin(actor)?;
        Ok(MarketplaceStats {
            users: self.accounts.role_breakdown()?,
            postings: self.postings.status_counts()?,
            posting_fields: self.postings.field_breakdown()?,
            applications: self.applications.status_counts()?,
            notifications: self.notifications.totals()?,
        })
    }

    pub fn list_users(
        &self,
        actor: &AuthenticatedUser,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<Page<ProfileView>, AdminError> {
        require_admin(actor)?;
        let accounts = self.accounts.list(role, page)?;
        Ok(accounts.map(|account| account.profile_view()))
    }

    /// Disable an account and revoke every session it holds. Admins cannot
    /// lock themselves out.
    pub fn deactivate_user(
        &self,
        actor: &AuthenticatedUser,
        id: &UserId,
    ) -> Result<ProfileView, AdminError> {
        require_admin(actor)?;
        if &actor.id == id {
            return Err(AdminError::SelfDeactivation);
        }
        let mut account = self.accounts.fetch(id)?.ok_or(AdminError::NotFound)?;
        account.active = false;
        self.accounts.update(account.clone())?;
        let revoked = self.sessions.revoke_for_user(id)?;
        tracing::info!(user = %id.0, revoked, "account deactivated");
        Ok(account.profile_view())
    }

    /// Re-enable a deactivated account. Old sessions stay revoked; the user
    /// logs in again.
    pub fn reactivate_user(
        &self,
        actor: &AuthenticatedUser,
        id: &UserId,
    ) -> Result<ProfileView, AdminError> {
        require_admin(actor)?;
        let mut account = self.accounts.fetch(id)?.ok_or(AdminError::NotFound)?;
        account.active = true;
        self.accounts.update(account.clone())?;
        tracing::info!(user = %id.0, "account reactivated");
        Ok(account.profile_view())
    }
}

fn require_admin(actor: &AuthenticatedUser) -> Result<(), AdminError> {
    if actor.role == UserRole::Admin {
        Ok(())
    } else {
        Err(AdminError::Forbidden("admin role required"))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("user not found")]
    NotFound,
    #[error("admins cannot deactivate their own account")]
    SelfDeactivation,
    #[error("{0}")]
    Forbidden(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
