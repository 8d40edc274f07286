pub mod domain;
pub(crate) mod password;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{AuthenticatedUser, Session, UserAccount, UserId, UserRole};
pub use router::{auth_failure, auth_router, BearerToken};
pub use service::{AccountService, AuthError, Authenticator};
