use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, State},
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::{LoginRequest, ProfileUpdate, RegistrationRequest, SessionView};
use super::repository::{AccountRepository, SessionStore};
use super::service::{AccountService, AuthError, Authenticator};
use crate::marketplace::repository::RepositoryError;

/// Bearer credential pulled from the `Authorization` header. Rejects with a
/// 401 before the handler body runs when the header is absent or malformed.
pub struct BearerToken(pub String);

#[axum::async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        match token {
            Some(token) => Ok(BearerToken(token.to_string())),
            None => {
                let payload = json!({ "error": "missing bearer token" });
                Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
            }
        }
    }
}

/// Shared HTTP mapping for authentication and account errors, reused by the
/// other marketplace routers and the API service when an authenticate step
/// fails.
pub fn auth_failure(error: AuthError) -> Response {
    let status = match &error {
        AuthError::InvalidCredentials | AuthError::SessionExpired => StatusCode::UNAUTHORIZED,
        AuthError::AccountDisabled | AuthError::RequiresRole(_) => StatusCode::FORBIDDEN,
        AuthError::DuplicateEmail => StatusCode::CONFLICT,
        AuthError::WeakPassword
        | AuthError::InvalidEmail
        | AuthError::MissingDisplayName
        | AuthError::StudentProfileField(_)
        | AuthError::AdminRegistrationClosed => StatusCode::UNPROCESSABLE_ENTITY,
        AuthError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let payload = json!({ "error": error.to_string() });
    (status, axum::Json(payload)).into_response()
}

/// Router builder exposing registration, login, and profile endpoints.
pub fn auth_router<R, S>(service: Arc<AccountService<R, S>>) -> Router
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    Router::new()
        .route("/api/v1/auth/register", post(register_handler::<R, S>))
        .route("/api/v1/auth/login", post(login_handler::<R, S>))
        .route("/api/v1/auth/logout", post(logout_handler::<R, S>))
        .route(
            "/api/v1/auth/me",
            get(profile_handler::<R, S>).patch(update_profile_handler::<R, S>),
        )
        .with_state(service)
}

pub(crate) async fn register_handler<R, S>(
    State(service): State<Arc<AccountService<R, S>>>,
    axum::Json(request): axum::Json<RegistrationRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    match service.register(request) {
        Ok(account) => (StatusCode::CREATED, axum::Json(account.profile_view())).into_response(),
        Err(error) => auth_failure(error),
    }
}

pub(crate) async fn login_handler<R, S>(
    State(service): State<Arc<AccountService<R, S>>>,
    axum::Json(request): axum::Json<LoginRequest>,
) -> Response
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    match service.login(request) {
        Ok((session, account)) => {
            let view = SessionView {
                token: session.token,
                expires_at: session.expires_at,
                profile: account.profile_view(),
            };
            (StatusCode::OK, axum::Json(view)).into_response()
        }
        Err(error) => auth_failure(error),
    }
}

pub(crate) async fn logout_handler<R, S>(
    State(service): State<Arc<AccountService<R, S>>>,
    token: BearerToken,
) -> Response
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    match service.logout(&token.0) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => auth_failure(error),
    }
}

pub(crate) async fn profile_handler<R, S>(
    State(service): State<Arc<AccountService<R, S>>>,
    token: BearerToken,
) -> Response
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    let user = match service.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match service.profile(&user.id) {
        Ok(account) => (StatusCode::OK, axum::Json(account.profile_view())).into_response(),
        Err(error) => auth_failure(error),
    }
}

pub(crate) async fn update_profile_handler<R, S>(
    State(service): State<Arc<AccountService<R, S>>>,
    token: BearerToken,
    axum::Json(update): axum::Json<ProfileUpdate>,
) -> Response
where
    R: AccountRepository + 'static,
    S: SessionStore + 'static,
{
    let user = match service.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match service.update_profile(&user.id, update) {
        Ok(account) => (StatusCode::OK, axum::Json(account.profile_view())).into_response(),
        Err(error) => auth_failure(error),
    }
}
