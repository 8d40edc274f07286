use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::domain::{Notification, NotificationId, NotificationKind};
use super::repository::{NotificationFanout, NotificationRepository, NotificationTotals};
use crate::marketplace::accounts::UserId;
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

static NOTIFICATION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_notification_id() -> NotificationId {
    let id = NOTIFICATION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    NotificationId(format!("ntf-{id:06}"))
}

/// Outbound notification hook consumed by the posting, application, and
/// wishlist services. Implemented by [`NotificationService`]; the trait keeps
/// those services testable with a recording stub.
pub trait Notifier: Send + Sync {
    fn notify(
        &self,
        recipient: &UserId,
        kind: NotificationKind,
        message: String,
        link: Option<String>,
    ) -> Result<Notification, NotificationError>;
}

/// Service composing the notification repository and the live fanout hook.
pub struct NotificationService<R, F> {
    repository: Arc<R>,
    fanout: Arc<F>,
}

impl<R, F> NotificationService<R, F>
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
{
    pub fn new(repository: Arc<R>, fanout: Arc<F>) -> Self {
        Self { repository, fanout }
    }

    pub fn list_for(
        &self,
        recipient: &UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, NotificationError> {
        let page = self.repository.for_recipient(recipient, page)?;
        Ok(page)
    }

    pub fn unread_count(&self, recipient: &UserId) -> Result<usize, NotificationError> {
        let count = self.repository.unread_count(recipient)?;
        Ok(count)
    }

    /// Mark one notification read. Another user's notification is reported
    /// as missing rather than forbidden so ids stay unguessable.
    pub fn mark_read(
        &self,
        recipient: &UserId,
        id: &NotificationId,
    ) -> Result<Notification, NotificationError> {
        let mut notification = self
            .repository
            .fetch(id)?
            .filter(|notification| notification.recipient == *recipient)
            .ok_or(RepositoryError::NotFound)?;

        if !notification.read {
            notification.read = true;
            self.repository.update(notification.clone())?;
        }
        Ok(notification)
    }

    pub fn mark_all_read(&self, recipient: &UserId) -> Result<usize, NotificationError> {
        let updated = self.repository.mark_all_read(recipient)?;
        Ok(updated)
    }

    pub fn totals(&self) -> Result<NotificationTotals, NotificationError> {
        let totals = self.repository.totals()?;
        Ok(totals)
    }
}

impl<R, F> Notifier for NotificationService<R, F>
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
{
    /// Persist first, then attempt live delivery. A failed push is logged
    /// and dropped; the recipient still sees the notification on next fetch.
    fn notify(
        &self,
        recipient: &UserId,
        kind: NotificationKind,
        message: String,
        link: Option<String>,
    ) -> Result<Notification, NotificationError> {
        let notification = Notification {
            id: next_notification_id(),
            recipient: recipient.clone(),
            kind,
            message,
            link,
            read: false,
            created_at: Utc::now(),
        };

        let stored = self.repository.insert(notification)?;

        if let Err(error) = self.fanout.push(&stored) {
            tracing::debug!(
                recipient = %stored.recipient.0,
                notification = %stored.id.0,
                %error,
                "live notification push dropped"
            );
        }

        Ok(stored)
    }
}

/// Error raised by the notification service.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
