//! Operator dashboard: marketplace-wide counters and account management.

pub mod router;
pub mod service;

pub use router::admin_router;
pub use service::{AdminError, AdminService, MarketplaceStats};
