use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Local;
use serde_json::json;

use super::domain::{AdvanceRequest, SubmissionRequest};
use super::repository::ApplicationRepository;
use super::service::{ApplicationError, ApplicationService};
use crate::marketplace::accounts::router::auth_failure;
use crate::marketplace::accounts::{Authenticator, BearerToken};
use crate::marketplace::applications::domain::ApplicationId;
use crate::marketplace::notifications::Notifier;
use crate::marketplace::pagination::PageQuery;
use crate::marketplace::postings::repository::PostingRepository;
use crate::marketplace::postings::PostingId;
use crate::marketplace::repository::RepositoryError;

/// Shared state for the application endpoints.
pub struct ApplicationRoutes<A, P, N, G> {
    pub service: ApplicationService<A, P, N>,
    pub auth: Arc<G>,
}

pub fn application_router<A, P, N, G>(routes: Arc<ApplicationRoutes<A, P, N, G>>) -> Router
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    Router::new()
        .route(
            "/api/v1/postings/:posting_id/applications",
            post(submit_endpoint::<A, P, N, G>).get(posting_applications_endpoint::<A, P, N, G>),
        )
        .route(
            "/api/v1/applications/mine",
            get(my_applications_endpoint::<A, P, N, G>),
        )
        .route(
            "/api/v1/applications/:application_id",
            get(application_endpoint::<A, P, N, G>)
                .delete(withdraw_endpoint::<A, P, N, G>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            post(advance_endpoint::<A, P, N, G>),
        )
        .with_state(routes)
}

pub(crate) async fn submit_endpoint<A, P, N, G>(
    State(state): State<Arc<ApplicationRoutes<A, P, N, G>>>,
    token: BearerToken,
    Path(posting_id): Path<String>,
    Json(request): Json<SubmissionRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let today = Local::now().date_naive();
    let submitted = state
        .service
        .submit(&user, &PostingId(posting_id), request, today)
        .and_then(|application| state.service.render(&application));

    match submitted {
        Ok(view) => (StatusCode::ACCEPTED, Json(view)).into_response(),
        Err(error) => application_failure(error),
    }
}

pub(crate) async fn my_applications_endpoint<A, P, N, G>(
    State(state): State<Arc<ApplicationRoutes<A, P, N, G>>>,
    token: BearerToken,
    Query(query): Query<PageQuery>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let listed = state
        .service
        .for_student(&user, query.into())
        .and_then(|page| state.service.render_page(page));

    match listed {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => application_failure(error),
    }
}

pub(crate) async fn posting_applications_endpoint<A, P, N, G>(
    State(state): State<Arc<ApplicationRoutes<A, P, N, G>>>,
    token: BearerToken,
    Path(posting_id): Path<String>,
    Query(query): Query<PageQuery>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let listed = state
        .service
        .for_posting(&user, &PostingId(posting_id), query.into())
        .and_then(|page| state.service.render_page(page));

    match listed {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(error) => application_failure(error),
    }
}

pub(crate) async fn application_endpoint<A, P, N, G>(
    State(state): State<Arc<ApplicationRoutes<A, P, N, G>>>,
    token: BearerToken,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let fetched = state
        .service
        .get(&user, &ApplicationId(application_id))
        .and_then(|application| state.service.render(&application));

    match fetched {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => application_failure(error),
    }
}

pub(crate) async fn withdraw_endpoint<A, P, N, G>(
    State(state): State<Arc<ApplicationRoutes<A, P, N, G>>>,
    token: BearerToken,
    Path(application_id): Path<String>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.withdraw(&user, &ApplicationId(application_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => application_failure(error),
    }
}

pub(crate) async fn advance_endpoint<A, P, N, G>(
    State(state): State<Arc<ApplicationRoutes<A, P, N, G>>>,
    token: BearerToken,
    Path(application_id): Path<String>,
    Json(request): Json<AdvanceRequest>,
) -> Response
where
    A: ApplicationRepository + 'static,
    P: PostingRepository + 'static,
    N: Notifier + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let advanced = state
        .service
        .advance(&user, &ApplicationId(application_id), request)
        .and_then(|application| state.service.render(&application));

    match advanced {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(error) => application_failure(error),
    }
}

fn application_failure(error: ApplicationError) -> Response {
    let status = match &error {
        ApplicationError::NotFound | ApplicationError::PostingNotFound => StatusCode::NOT_FOUND,
        ApplicationError::AlreadyApplied => StatusCode::CONFLICT,
        ApplicationError::PostingClosed
        | ApplicationError::DeadlinePassed
        | ApplicationError::IllegalTransition { .. }
        | ApplicationError::AlreadyDecided => StatusCode::UNPROCESSABLE_ENTITY,
        ApplicationError::Forbidden(_) => StatusCode::FORBIDDEN,
        ApplicationError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        ApplicationError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        ApplicationError::Repository(RepositoryError::Unavailable(_))
        | ApplicationError::Notification(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
