use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::Local;
use serde_json::json;

use super::domain::{WishlistDraft, WishlistItemId, WishlistUpdate};
use super::repository::WishlistRepository;
use super::service::{WishlistError, WishlistService};
use crate::marketplace::accounts::router::auth_failure;
use crate::marketplace::accounts::{Authenticator, BearerToken};
use crate::marketplace::notifications::Notifier;
use crate::marketplace::postings::repository::PostingRepository;
use crate::marketplace::repository::RepositoryError;

/// Shared state for the wishlist endpoints.
pub struct WishlistRoutes<W, P, N, G> {
    pub service: WishlistService<W, P, N>,
    pub auth: Arc<G>,
}

pub fn wishlist_router<W, P, N, G>(routes: Arc<WishlistRoutes<W, P, N, G>>) -> Router
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    Router::new()
        .route(
            "/api/v1/wishlist",
            post(add_endpoint::<W, P, N, G>).get(list_endpoint::<W, P, N, G>),
        )
        .route(
            "/api/v1/wishlist/:item_id",
            patch(update_endpoint::<W, P, N, G>).delete(remove_endpoint::<W, P, N, G>),
        )
        .route(
            "/api/v1/wishlist/reminders/run",
            post(sweep_endpoint::<W, P, N, G>),
        )
        .with_state(routes)
}

pub(crate) async fn add_endpoint<W, P, N, G>(
    State(state): State<Arc<WishlistRoutes<W, P, N, G>>>,
    token: BearerToken,
    Json(draft): Json<WishlistDraft>,
) -> Response
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let today = Local::now().date_naive();
    let added = state
        .service
        .add(&user, draft, today)
        .and_then(|item| state.service.render(&item, today));

    match added {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(error) => wishlist_failure(error),
    }
}

pub(crate) async fn list_endpoint<W, P, N, G>(
    State(state): State<Arc<WishlistRoutes<W, P, N, G>>>,
    token: BearerToken,
) -> Response
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let today = Local::now().date_naive();
    match state.service.list(&user, today) {
        Ok(views) => (StatusCode::OK, Json(views)).into_response(),
        Err(error) => wishlist_failure(error),
    }
}

pub(crate) async fn update_endpoint<W, P, N, G>(
    State(state): State<Arc<WishlistRoutes<W, P, N, G>>>,
    token: BearerToken,
    Path(item_id): Path<String>,
    Json(update): Json<WishlistUpdate>,
) -> Response
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let today = Local::now().date_naive();
    let updated = state
        .service
        .update(&user, &WishlistItemId(item_id), update)
        .and_then(|item| state.service.render(&item, today));

    match updated {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => wishlist_failure(error),
    }
}

pub(crate) async fn remove_endpoint<W, P, N, G>(
    State(state): State<Arc<WishlistRoutes<W, P, N, G>>>,
    token: BearerToken,
    Path(item_id): Path<String>,
) -> Response
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.remove(&user, &WishlistItemId(item_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => wishlist_failure(error),
    }
}

pub(crate) async fn sweep_endpoint<W, P, N, G>(
    State(state): State<Arc<WishlistRoutes<W, P, N, G>>>,
    token: BearerToken,
) -> Response
where
    W: WishlistRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let today = Local::now().date_naive();
    match state.service.run_reminder_sweep(&user, today) {
        Ok(sent) => (StatusCode::OK, Json(json!({ "sent": sent }))).into_response(),
        Err(error) => wishlist_failure(error),
    }
}

fn wishlist_failure(error: WishlistError) -> Response {
    let status = match &error {
        WishlistError::NotFound | WishlistError::PostingNotFound => StatusCode::NOT_FOUND,
        WishlistError::AlreadySaved => StatusCode::CONFLICT,
        WishlistError::Forbidden(_) => StatusCode::FORBIDDEN,
        WishlistError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        WishlistError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        WishlistError::Repository(RepositoryError::Unavailable(_))
        | WishlistError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
