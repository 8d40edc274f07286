use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use super::service::{AdminError, AdminService};
use crate::marketplace::accounts::repository::{AccountRepository, SessionStore};
use crate::marketplace::accounts::router::auth_failure;
use crate::marketplace::accounts::{Authenticator, BearerToken, UserId, UserRole};
use crate::marketplace::applications::repository::ApplicationRepository;
use crate::marketplace::notifications::repository::NotificationRepository;
use crate::marketplace::pagination::PageRequest;
use crate::marketplace::postings::repository::PostingRepository;
use crate::marketplace::repository::RepositoryError;

/// Shared state for the admin endpoints.
pub struct AdminRoutes<U, S, P, A, N, G> {
    pub service: AdminService<U, S, P, A, N>,
    pub auth: Arc<G>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct UserListQuery {
    role: Option<UserRole>,
    page: Option<u32>,
    per_page: Option<u32>,
}

pub fn admin_router<U, S, P, A, N, G>(routes: Arc<AdminRoutes<U, S, P, A, N, G>>) -> Router
where
    U: AccountRepository + 'static,
    S: SessionStore + 'static,
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
    G: Authenticator + 'static,
{
    Router::new()
        .route("/api/v1/admin/stats", get(stats_endpoint::<U, S, P, A, N, G>))
        .route("/api/v1/admin/users", get(users_endpoint::<U, S, P, A, N, G>))
        .route(
            "/api/v1/admin/users/:user_id/deactivate",
            post(deactivate_endpoint::<U, S, P, A, N, G>),
        )
        .route(
            "/api/v1/admin/users/:user_id/reactivate",
            post(reactivate_endpoint::<U, S, P, A, N, G>),
        )
        .with_state(routes)
}

pub(crate) async fn stats_endpoint<U, S, P, A, N, G>(
    State(state): State<Arc<AdminRoutes<U, S, P, A, N, G>>>,
    token: BearerToken,
) -> Response
where
    U: AccountRepository + 'static,
    S: SessionStore + 'static,
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.stats(&user) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(error) => admin_failure(error),
    }
}

pub(crate) async fn users_endpoint<U, S, P, A, N, G>(
    State(state): State<Arc<AdminRoutes<U, S, P, A, N, G>>>,
    token: BearerToken,
    Query(query): Query<UserListQuery>,
) -> Response
where
    U: AccountRepository + 'static,
    S: SessionStore + 'static,
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let page = PageRequest::new(query.page, query.per_page);
    match state.service.list_users(&user, query.role, page) {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => admin_failure(error),
    }
}

pub(crate) async fn deactivate_endpoint<U, S, P, A, N, G>(
    State(state): State<Arc<AdminRoutes<U, S, P, A, N, G>>>,
    token: BearerToken,
    Path(user_id): Path<String>,
) -> Response
where
    U: AccountRepository + 'static,
    S: SessionStore + 'static,
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.deactivate_user(&user, &UserId(user_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => admin_failure(error),
    }
}

pub(crate) async fn reactivate_endpoint<U, S, P, A, N, G>(
    State(state): State<Arc<AdminRoutes<U, S, P, A, N, G>>>,
    token: BearerToken,
    Path(user_id): Path<String>,
) -> Response
where
    U: AccountRepository + 'static,
    S: SessionStore + 'static,
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: NotificationRepository + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.reactivate_user(&user, &UserId(user_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => admin_failure(error),
    }
}

fn admin_failure(error: AdminError) -> Response {
    let status = match &error {
        AdminError::NotFound => StatusCode::NOT_FOUND,
        AdminError::SelfDeactivation => StatusCode::UNPROCESSABLE_ENTITY,
        AdminError::Forbidden(_) => StatusCode::FORBIDDEN,
        AdminError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AdminError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AdminError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
