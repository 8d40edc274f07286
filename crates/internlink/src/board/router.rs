use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;

use super::domain::{JobDraft, JobFilter, JobId};
use super::repository::JobRepository;
use super::service::{JobBoardService, JobError};
use crate::marketplace::pagination::PageRequest;
use crate::marketplace::repository::RepositoryError;

/// Shared state for the board endpoints.
pub struct JobRoutes<R> {
    pub service: Arc<JobBoardService<R>>,
}

/// Router builder for the standalone board. Every endpoint is public.
pub fn job_router<R>(state: Arc<JobRoutes<R>>) -> Router
where
    R: JobRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(search_handler::<R>).post(create_handler::<R>),
        )
        .route(
            "/api/v1/jobs/:job_id",
            get(get_handler::<R>).delete(delete_handler::<R>),
        )
        .with_state(state)
}

/// Query-string shape for board searches.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct BoardQuery {
    q: Option<String>,
    location: Option<String>,
    page: Option<u32>,
    per_page: Option<u32>,
}

pub(crate) fn job_failure(error: JobError) -> Response {
    let status = match &error {
        JobError::NotFound => StatusCode::NOT_FOUND,
        JobError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        JobError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        JobError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) async fn create_handler<R>(
    State(state): State<Arc<JobRoutes<R>>>,
    axum::Json(draft): axum::Json<JobDraft>,
) -> Response
where
    R: JobRepository + 'static,
{
    let today = Local::now().date_naive();
    match state.service.create(draft, today) {
        Ok(job) => (StatusCode::CREATED, axum::Json(job)).into_response(),
        Err(error) => job_failure(error),
    }
}

pub(crate) async fn search_handler<R>(
    State(state): State<Arc<JobRoutes<R>>>,
    Query(query): Query<BoardQuery>,
) -> Response
where
    R: JobRepository + 'static,
{
    let filter = JobFilter {
        text: query.q,
        location: query.location,
    };
    let page = PageRequest::new(query.page, query.per_page);

    match state.service.search(&filter, page) {
        Ok(page) => (StatusCode::OK, axum::Json(page)).into_response(),
        Err(error) => job_failure(error),
    }
}

pub(crate) async fn get_handler<R>(
    State(state): State<Arc<JobRoutes<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match state.service.get(&JobId(job_id)) {
        Ok(job) => (StatusCode::OK, axum::Json(job)).into_response(),
        Err(error) => job_failure(error),
    }
}

pub(crate) async fn delete_handler<R>(
    State(state): State<Arc<JobRoutes<R>>>,
    Path(job_id): Path<String>,
) -> Response
where
    R: JobRepository + 'static,
{
    match state.service.delete(&JobId(job_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => job_failure(error),
    }
}
