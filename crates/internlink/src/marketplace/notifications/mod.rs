pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{Notification, NotificationId, NotificationKind};
pub use repository::{FanoutError, NotificationFanout, NotificationRepository};
pub use router::notification_router;
pub use service::{NotificationError, NotificationService, Notifier};
