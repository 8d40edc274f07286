use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::service::AuthError;

/// Identifier wrapper for registered accounts.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(pub String);

/// Marketplace roles with distinct permissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Student,
    Company,
    Admin,
}

impl UserRole {
    pub const fn label(self) -> &'static str {
        match self {
            UserRole::Student => "student",
            UserRole::Company => "company",
            UserRole::Admin => "admin",
        }
    }
}

/// Stored account record, including the salted password digest. Never
/// serialized to API responses directly; see [`ProfileView`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub password_hash: String,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Vec<String>,
    pub website: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl UserAccount {
    pub fn profile_view(&self) -> ProfileView {
        ProfileView {
            id: self.id.clone(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            role: self.role.label(),
            headline: self.headline.clone(),
            bio: self.bio.clone(),
            skills: self.skills.clone(),
            website: self.website.clone(),
            active: self.active,
            created_at: self.created_at,
        }
    }
}

/// Payload accepted by the registration endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub website: Option<String>,
}

/// Payload accepted by the login endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Partial profile edit; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub headline: Option<String>,
    pub bio: Option<String>,
    pub skills: Option<Vec<String>>,
    pub website: Option<String>,
}

/// Opaque login session. Tokens are random and carry no claims; all state
/// lives behind the [`super::repository::SessionStore`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub role: UserRole,
    pub display_name: String,
}

impl AuthenticatedUser {
    pub fn require_role(&self, role: UserRole) -> Result<(), AuthError> {
        if self.role == role {
            Ok(())
        } else {
            Err(AuthError::RequiresRole(role.label()))
        }
    }
}

/// Sanitized representation of an account for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    pub skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Response body returned by a successful login.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub profile: ProfileView,
}
