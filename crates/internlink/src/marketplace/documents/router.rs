use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use super::domain::{DocumentCategory, DocumentId, DocumentView, StoredDocument};
use super::repository::DocumentRepository;
use super::service::{DocumentError, DocumentService};
use super::store::DocumentStore;
use crate::marketplace::accounts::router::auth_failure;
use crate::marketplace::accounts::{Authenticator, BearerToken};
use crate::marketplace::repository::RepositoryError;

/// Headroom on top of the upload cap so the multipart boundary lines and
/// part headers do not push a maximum-size file over the body limit.
const MULTIPART_OVERHEAD: usize = 8 * 1024;

/// Shared state for the document endpoints.
pub struct DocumentRoutes<R, S, G> {
    pub service: DocumentService<R, S>,
    pub auth: Arc<G>,
}

pub fn document_router<R, S, G>(routes: Arc<DocumentRoutes<R, S, G>>) -> Router
where
    R: DocumentRepository + 'static,
    S: DocumentStore + 'static,
    G: Authenticator + 'static,
{
    let body_limit = routes
        .service
        .max_bytes()
        .saturating_add(MULTIPART_OVERHEAD);
    Router::new()
        .route(
            "/api/v1/documents",
            post(upload_endpoint::<R, S, G>).get(my_documents_endpoint::<R, S, G>),
        )
        .route(
            "/api/v1/documents/:document_id",
            get(document_endpoint::<R, S, G>),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(routes)
}

pub(crate) async fn upload_endpoint<R, S, G>(
    State(state): State<Arc<DocumentRoutes<R, S, G>>>,
    token: BearerToken,
    mut multipart: Multipart,
) -> Response
where
    R: DocumentRepository + 'static,
    S: DocumentStore + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let mut upload: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut category = DocumentCategory::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => return multipart_failure(error),
        };
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().map(|value| value.to_string());
                let bytes = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(error) => return multipart_failure(error),
                };
                upload = Some((file_name, content_type, bytes));
            }
            "category" => {
                let raw = match field.text().await {
                    Ok(text) => text,
                    Err(error) => return multipart_failure(error),
                };
                category = match DocumentCategory::parse(&raw) {
                    Some(parsed) => parsed,
                    None => {
                        return (
                            StatusCode::UNPROCESSABLE_ENTITY,
                            Json(json!({ "error": format!("unknown document category {raw:?}") })),
                        )
                            .into_response()
                    }
                };
            }
            _ => {}
        }
    }

    let Some((file_name, content_type, bytes)) = upload else {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "error": "multipart field `file` is required" })),
        )
            .into_response();
    };

    match state
        .service
        .upload(&user, &file_name, category, content_type, bytes)
    {
        Ok(document) => (StatusCode::CREATED, Json(document.view())).into_response(),
        Err(error) => document_failure(error),
    }
}

pub(crate) async fn document_endpoint<R, S, G>(
    State(state): State<Arc<DocumentRoutes<R, S, G>>>,
    token: BearerToken,
    Path(document_id): Path<String>,
) -> Response
where
    R: DocumentRepository + 'static,
    S: DocumentStore + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.fetch(&user, &DocumentId(document_id)) {
        Ok((document, bytes)) => {
            let disposition = format!("attachment; filename=\"{}\"", document.file_name);
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, document.content_type.clone()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(error) => document_failure(error),
    }
}

pub(crate) async fn my_documents_endpoint<R, S, G>(
    State(state): State<Arc<DocumentRoutes<R, S, G>>>,
    token: BearerToken,
) -> Response
where
    R: DocumentRepository + 'static,
    S: DocumentStore + 'static,
    G: Authenticator + 'static,
{
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    match state.service.list(&user) {
        Ok(documents) => {
            let views: Vec<DocumentView> =
                documents.iter().map(StoredDocument::view).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => document_failure(error),
    }
}

fn multipart_failure(error: axum::extract::multipart::MultipartError) -> Response {
    (
        error.status(),
        Json(json!({ "error": error.body_text() })),
    )
        .into_response()
}

fn document_failure(error: DocumentError) -> Response {
    let status = match &error {
        DocumentError::NotFound => StatusCode::NOT_FOUND,
        DocumentError::EmptyUpload => StatusCode::UNPROCESSABLE_ENTITY,
        DocumentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        DocumentError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        DocumentError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        DocumentError::Repository(RepositoryError::Unavailable(_))
        | DocumentError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}
