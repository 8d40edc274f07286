use serde::Serialize;

use super::domain::{Notification, NotificationId};
use crate::marketplace::accounts::UserId;
use crate::marketplace::pagination::{Page, PageRequest};
use crate::marketplace::repository::RepositoryError;

/// Storage abstraction so the service module can be exercised in isolation.
pub trait NotificationRepository: Send + Sync {
    fn insert(&self, notification: Notification) -> Result<Notification, RepositoryError>;
    fn update(&self, notification: Notification) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &NotificationId) -> Result<Option<Notification>, RepositoryError>;
    /// A recipient's notifications ordered newest first.
    fn for_recipient(
        &self,
        recipient: &UserId,
        page: PageRequest,
    ) -> Result<Page<Notification>, RepositoryError>;
    fn unread_count(&self, recipient: &UserId) -> Result<usize, RepositoryError>;
    fn mark_all_read(&self, recipient: &UserId) -> Result<usize, RepositoryError>;
    fn totals(&self) -> Result<NotificationTotals, RepositoryError>;
}

/// Marketplace-wide counters surfaced on the admin dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationTotals {
    pub total: usize,
    pub unread: usize,
}

/// Live delivery hook implemented by the API service's websocket hub.
/// Delivery is best effort; persistence is the source of truth.
pub trait NotificationFanout: Send + Sync {
    fn push(&self, notification: &Notification) -> Result<(), FanoutError>;
}

/// Live delivery error.
#[derive(Debug, thiserror::Error)]
pub enum FanoutError {
    #[error("failed to encode live payload: {0}")]
    Encode(String),
    #[error("fanout transport unavailable: {0}")]
    Transport(String),
}
