use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::marketplace::accounts::UserId;

/// Identifier wrapper for stored notifications.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NotificationId(pub String);

/// What happened, so clients can route and render without parsing prose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    NewApplication,
    ApplicationStatusChanged,
    ApplicationWithdrawn,
    PostingClosed,
    WishlistDeadline,
    AdminNotice,
}

impl NotificationKind {
    pub const fn label(self) -> &'static str {
        match self {
            NotificationKind::NewApplication => "new_application",
            NotificationKind::ApplicationStatusChanged => "application_status_changed",
            NotificationKind::ApplicationWithdrawn => "application_withdrawn",
            NotificationKind::PostingClosed => "posting_closed",
            NotificationKind::WishlistDeadline => "wishlist_deadline",
            NotificationKind::AdminNotice => "admin_notice",
        }
    }
}

/// Stored notification. The same shape is serialized onto the live stream,
/// so clients handle both channels with one decoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub recipient: UserId,
    pub kind: NotificationKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}
