use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;

use super::domain::NotificationId;
use super::repository::{NotificationFanout, NotificationRepository};
use super::service::{NotificationError, NotificationService};
use crate::marketplace::accounts::router::auth_failure;
use crate::marketplace::accounts::{Authenticator, BearerToken};
use crate::marketplace::pagination::PageQuery;
use crate::marketplace::repository::RepositoryError;

/// Shared state for the notification endpoints.
pub struct NotificationRoutes<R, F, G> {
    pub service: Arc<NotificationService<R, F>>,
    pub auth: Arc<G>,
}

/// Router builder exposing the notification inbox endpoints.
pub fn notification_router<R, F, G>(state: Arc<NotificationRoutes<R, F, G>>) -> Router
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
    G: Authenticator + 'static,
{
    Router::new()
        .route("/api/v1/notifications", get(list_handler::<R, F, G>))
        .route(
            "/api/v1/notifications/unread_count",
            get(unread_count_handler::<R, F, G>),
        )
        .route(
            "/api/v1/notifications/:notification_id/read",
            post(mark_read_handler::<R, F, G>),
        )
        .route(
            "/api/v1/notifications/read_all",
            post(mark_all_read_handler::<R, F, G>),
        )
        .with_state(state)
}

fn notification_failure(error: NotificationError) -> Response {
    let status = match &error {
        NotificationError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        NotificationError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) async fn list_handler<R, F, G>(
    State(state): State<Arc<NotificationRoutes<R, F, G>>>,
    token: BearerToken,
    Query(page): Query<PageQuery>,
) -> Response
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.list_for(&user.id, page.into()) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => notification_failure(error),
    }
}

pub(crate) async fn unread_count_handler<R, F, G>(
    State(state): State<Arc<NotificationRoutes<R, F, G>>>,
    token: BearerToken,
) -> Response
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.unread_count(&user.id) {
        Ok(unread) => (StatusCode::OK, axum::Json(json!({ "unread": unread }))).into_response(),
        Err(error) => notification_failure(error),
    }
}

pub(crate) async fn mark_read_handler<R, F, G>(
    State(state): State<Arc<NotificationRoutes<R, F, G>>>,
    token: BearerToken,
    Path(notification_id): Path<String>,
) -> Response
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let id = NotificationId(notification_id);
    match state.service.mark_read(&user.id, &id) {
        Ok(notification) => (StatusCode::OK, axum::Json(notification)).into_response(),
        Err(error) => notification_failure(error),
    }
}

pub(crate) async fn mark_all_read_handler<R, F, G>(
    State(state): State<Arc<NotificationRoutes<R, F, G>>>,
    token: BearerToken,
) -> Response
where
    R: NotificationRepository + 'static,
    F: NotificationFanout + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.mark_all_read(&user.id) {
        Ok(updated) => (StatusCode::OK, axum::Json(json!({ "updated": updated }))).into_response(),
        Err(error) => notification_failure(error),
    }
}
