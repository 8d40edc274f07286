//! Saved postings with per-item deadline reminders.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    DeadlineOutlook, WishCategory, WishPriority, WishView, WishlistDraft, WishlistItem,
    WishlistItemId, WishlistUpdate,
};
pub use repository::WishlistRepository;
pub use router::wishlist_router;
pub use service::{WishlistError, WishlistService};
