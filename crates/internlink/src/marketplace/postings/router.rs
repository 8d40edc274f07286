use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{FieldOfWork, PostingDraft, PostingFilter, PostingId, PostingStatus, PostingUpdate};
use super::repository::PostingRepository;
use super::service::{PostingError, PostingService};
use crate::marketplace::accounts::router::auth_failure;
use crate::marketplace::accounts::{Authenticator, BearerToken, UserRole};
use crate::marketplace::applications::repository::ApplicationRepository;
use crate::marketplace::notifications::Notifier;
use crate::marketplace::pagination::PageRequest;
use crate::marketplace::repository::RepositoryError;

/// Shared state for the posting endpoints.
pub struct PostingRoutes<P, A, N, G> {
    pub service: Arc<PostingService<P, A, N>>,
    pub auth: Arc<G>,
}

/// Router builder exposing the posting catalog and management endpoints.
pub fn posting_router<P, A, N, G>(state: Arc<PostingRoutes<P, A, N, G>>) -> Router
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    Router::new()
        .route(
            "/api/v1/postings",
            get(search_handler::<P, A, N, G>).post(create_handler::<P, A, N, G>),
        )
        .route("/api/v1/postings/mine", get(mine_handler::<P, A, N, G>))
        .route(
            "/api/v1/postings/:posting_id",
            get(get_handler::<P, A, N, G>).patch(update_handler::<P, A, N, G>),
        )
        .route(
            "/api/v1/postings/:posting_id/close",
            post(close_handler::<P, A, N, G>),
        )
        .with_state(state)
}

/// Query-string shape for catalog searches.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct CatalogQuery {
    field: Option<FieldOfWork>,
    location: Option<String>,
    q: Option<String>,
    min_stipend: Option<u32>,
    status: Option<StatusParam>,
    page: Option<u32>,
    per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum StatusParam {
    Open,
    Closed,
    All,
}

impl StatusParam {
    fn into_filter(self) -> Option<PostingStatus> {
        match self {
            StatusParam::Open => Some(PostingStatus::Open),
            StatusParam::Closed => Some(PostingStatus::Closed),
            StatusParam::All => None,
        }
    }
}

/// HTTP mapping for posting errors, shared with the API service's bulk
/// import endpoint.
pub fn posting_failure(error: PostingError) -> Response {
    let status = match &error {
        PostingError::NotFound => StatusCode::NOT_FOUND,
        PostingError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PostingError::Forbidden(_) => StatusCode::FORBIDDEN,
        PostingError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        PostingError::Repository(_) | PostingError::Notification(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) async fn search_handler<P, A, N, G>(
    State(state): State<Arc<PostingRoutes<P, A, N, G>>>,
    Query(query): Query<CatalogQuery>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    // The public catalog hides closed postings unless asked otherwise.
    let status = query
        .status
        .map_or(Some(PostingStatus::Open), StatusParam::into_filter);

    let filter = PostingFilter {
        field: query.field,
        location: query.location,
        company: None,
        status,
        min_stipend: query.min_stipend,
        text: query.q,
    };
    let page = PageRequest::new(query.page, query.per_page);

    match state.service.search(filter, page) {
        Ok(page) => {
            let views = page.map(|posting| posting.view());
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => posting_failure(error),
    }
}

pub(crate) async fn create_handler<P, A, N, G>(
    State(state): State<Arc<PostingRoutes<P, A, N, G>>>,
    token: BearerToken,
    axum::Json(draft): axum::Json<PostingDraft>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let today = Local::now().date_naive();
    match state.service.create(&user, draft, today) {
        Ok(posting) => (StatusCode::CREATED, axum::Json(posting.view())).into_response(),
        Err(error) => posting_failure(error),
    }
}

pub(crate) async fn mine_handler<P, A, N, G>(
    State(state): State<Arc<PostingRoutes<P, A, N, G>>>,
    token: BearerToken,
    Query(query): Query<CatalogQuery>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };
    if let Err(error) = user.require_role(UserRole::Company) {
        return auth_failure(error);
    }

    // Companies see all of their postings, closed ones included.
    let status = query.status.and_then(StatusParam::into_filter);
    let filter = PostingFilter {
        field: query.field,
        location: query.location,
        company: Some(user.id),
        status,
        min_stipend: query.min_stipend,
        text: query.q,
    };
    let page = PageRequest::new(query.page, query.per_page);

    match state.service.search(filter, page) {
        Ok(page) => {
            let views = page.map(|posting| posting.view());
            (StatusCode::OK, axum::Json(views)).into_response()
        }
        Err(error) => posting_failure(error),
    }
}

pub(crate) async fn get_handler<P, A, N, G>(
    State(state): State<Arc<PostingRoutes<P, A, N, G>>>,
    Path(posting_id): Path<String>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let id = PostingId(posting_id);
    match state.service.get(&id) {
        Ok(posting) => (StatusCode::OK, axum::Json(posting.view())).into_response(),
        Err(error) => posting_failure(error),
    }
}

pub(crate) async fn update_handler<P, A, N, G>(
    State(state): State<Arc<PostingRoutes<P, A, N, G>>>,
    token: BearerToken,
    Path(posting_id): Path<String>,
    axum::Json(update): axum::Json<PostingUpdate>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let id = PostingId(posting_id);
    let today = Local::now().date_naive();
    match state.service.update(&user, &id, update, today) {
        Ok(posting) => (StatusCode::OK, axum::Json(posting.view())).into_response(),
        Err(error) => posting_failure(error),
    }
}

pub(crate) async fn close_handler<P, A, N, G>(
    State(state): State<Arc<PostingRoutes<P, A, N, G>>>,
    token: BearerToken,
    Path(posting_id): Path<String>,
) -> Response
where
    P: PostingRepository + 'static,
    A: ApplicationRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let id = PostingId(posting_id);
    match state.service.close(&user, &id) {
        Ok(posting) => (StatusCode::OK, axum::Json(posting.view())).into_response(),
        Err(error) => posting_failure(error),
    }
}
