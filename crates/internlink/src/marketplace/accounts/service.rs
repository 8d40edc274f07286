use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Duration, Utc};

use super::domain::{
    AuthenticatedUser, LoginRequest, ProfileUpdate, RegistrationRequest, Session, UserAccount,
    UserId, UserRole,
};
use super::password;
use super::repository::{AccountRepository, SessionStore};
use crate::config::SessionConfig;
use crate::marketplace::repository::RepositoryError;

pub const MIN_PASSWORD_LENGTH: usize = 8;

static ACCOUNT_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_user_id() -> UserId {
    let id = ACCOUNT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UserId(format!("user-{id:06}"))
}

/// Resolves bearer tokens into caller identities. Implemented by
/// [`AccountService`]; routers depend on the trait so they can be exercised
/// against stub identities in tests.
pub trait Authenticator: Send + Sync {
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

/// Service composing the account repository and session store.
pub struct AccountService<R, S> {
    accounts: Arc<R>,
    sessions: Arc<S>,
    session_ttl: Duration,
}

impl<R, S> AccountService<R, S>
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    pub fn new(accounts: Arc<R>, sessions: Arc<S>, config: &SessionConfig) -> Self {
        Self {
            accounts,
            sessions,
            session_ttl: Duration::hours(config.ttl_hours),
        }
    }

    /// Register a student or company account. Administrator accounts only
    /// come from [`AccountService::provision_admin`].
    pub fn register(&self, request: RegistrationRequest) -> Result<UserAccount, AuthError> {
        if matches!(request.role, UserRole::Admin) {
            return Err(AuthError::AdminRegistrationClosed);
        }

        let email = normalize_email(&request.email)?;
        validate_password(&request.password)?;

        let display_name = request.display_name.trim().to_string();
        if display_name.is_empty() {
            return Err(AuthError::MissingDisplayName);
        }

        if request.role != UserRole::Student {
            if request.headline.is_some() {
                return Err(AuthError::StudentProfileField("headline"));
            }
            if !request.skills.is_empty() {
                return Err(AuthError::StudentProfileField("skills"));
            }
            if request.bio.is_some() {
                return Err(AuthError::StudentProfileField("bio"));
            }
            if request.website.is_some() {
                return Err(AuthError::StudentProfileField("website"));
            }
        }

        if self.accounts.fetch_by_email(&email)?.is_some() {
            return Err(AuthError::DuplicateEmail);
        }

        let account = UserAccount {
            id: next_user_id(),
            email,
            display_name,
            role: request.role,
            password_hash: password::mint_hash(&request.password),
            headline: request.headline.and_then(none_if_blank),
            bio: request.bio.and_then(none_if_blank),
            skills: cleaned_skills(request.skills),
            website: request.website.and_then(none_if_blank),
            active: true,
            created_at: Utc::now(),
        };

        let stored = self.accounts.insert(account)?;
        Ok(stored)
    }

    /// Operator-provisioned administrator, run at service startup. Calling
    /// again with an email that is already registered returns the existing
    /// account untouched so restarts stay idempotent.
    pub fn provision_admin(&self, email: &str, password: &str) -> Result<UserAccount, AuthError> {
        let email = normalize_email(email)?;
        validate_password(password)?;

        if let Some(existing) = self.accounts.fetch_by_email(&email)? {
            return Ok(existing);
        }

        let account = UserAccount {
            id: next_user_id(),
            email,
            display_name: "Administrator".to_string(),
            role: UserRole::Admin,
            password_hash: password::mint_hash(password),
            headline: None,
            bio: None,
            skills: Vec::new(),
            website: None,
            active: true,
            created_at: Utc::now(),
        };

        let stored = self.accounts.insert(account)?;
        Ok(stored)
    }

    /// Verify credentials and mint a fresh session.
    pub fn login(&self, request: LoginRequest) -> Result<(Session, UserAccount), AuthError> {
        let email = normalize_email(&request.email).map_err(|_| AuthError::InvalidCredentials)?;
        let account = self
            .accounts
            .fetch_by_email(&email)?
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify(&request.password, &account.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }
        if !account.active {
            return Err(AuthError::AccountDisabled);
        }

        let issued_at = Utc::now();
        let session = Session {
            token: password::session_token(),
            user: account.id.clone(),
            issued_at,
            expires_at: issued_at + self.session_ttl,
        };
        self.sessions.insert(session.clone())?;

        Ok((session, account))
    }

    pub fn logout(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.revoke(token)?;
        Ok(())
    }

    pub fn profile(&self, user: &UserId) -> Result<UserAccount, AuthError> {
        let account = self.accounts.fetch(user)?.ok_or(RepositoryError::NotFound)?;
        Ok(account)
    }

    /// Apply a partial profile edit. Optional text fields submitted as blank
    /// strings are cleared. Email and role are immutable; the CV-style
    /// fields only exist on student profiles.
    pub fn update_profile(
        &self,
        user: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserAccount, AuthError> {
        let mut account = self.accounts.fetch(user)?.ok_or(RepositoryError::NotFound)?;

        if account.role != UserRole::Student {
            if update.headline.is_some() {
                return Err(AuthError::StudentProfileField("headline"));
            }
            if update.skills.is_some() {
                return Err(AuthError::StudentProfileField("skills"));
            }
            if update.bio.is_some() {
                return Err(AuthError::StudentProfileField("bio"));
            }
            if update.website.is_some() {
                return Err(AuthError::StudentProfileField("website"));
            }
        }

        if let Some(display_name) = update.display_name {
            let trimmed = display_name.trim().to_string();
            if trimmed.is_empty() {
                return Err(AuthError::MissingDisplayName);
            }
            account.display_name = trimmed;
        }
        if let Some(headline) = update.headline {
            account.headline = none_if_blank(headline);
        }
        if let Some(bio) = update.bio {
            account.bio = none_if_blank(bio);
        }
        if let Some(skills) = update.skills {
            account.skills = cleaned_skills(skills);
        }
        if let Some(website) = update.website {
            account.website = none_if_blank(website);
        }

        self.accounts.update(account.clone())?;
        Ok(account)
    }
}

impl<R, S> Authenticator for AccountService<R, S>
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    fn authenticate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let session = self
            .sessions
            .fetch(token)?
            .ok_or(AuthError::SessionExpired)?;
        let now = Utc::now();
        if session.expires_at <= now {
            // an expired lookup sweeps every stale row, not just this one
            self.sessions.purge_expired(now)?;
            return Err(AuthError::SessionExpired);
        }

        let account = self
            .accounts
            .fetch(&session.user)?
            .ok_or(AuthError::SessionExpired)?;
        if !account.active {
            return Err(AuthError::AccountDisabled);
        }

        Ok(AuthenticatedUser {
            id: account.id,
            role: account.role,
            display_name: account.display_name,
        })
    }
}

fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_ascii_lowercase();
    let plausible = email
        .split_once('@')
        .map(|(local, domain)| {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        })
        .unwrap_or(false);

    if plausible {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

fn none_if_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn cleaned_skills(skills: Vec<String>) -> Vec<String> {
    skills
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect()
}

/// Error raised by the account service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("email is already registered")]
    DuplicateEmail,
    #[error("session token is missing or expired")]
    SessionExpired,
    #[error("account is deactivated")]
    AccountDisabled,
    #[error("password must be at least 8 characters")]
    WeakPassword,
    #[error("email address is not plausible")]
    InvalidEmail,
    #[error("display name must not be blank")]
    MissingDisplayName,
    #[error("only student profiles carry a {0}")]
    StudentProfileField(&'static str),
    #[error("administrator accounts are provisioned by the operator")]
    AdminRegistrationClosed,
    #[error("operation requires the {0} role")]
    RequiresRole(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
