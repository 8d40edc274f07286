use crate::infra::{
    AppState, LiveNotificationHub, LiveNotifier, Marketplace, MemoryAccounts, MemoryApplications,
    MemoryPostings, MemorySessions,
};
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Local;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

use internlink::error::AppError;
use internlink::imports::{PostingCsvImporter, PostingImport};
use internlink::marketplace::accounts::{
    auth_failure, auth_router, AccountService, Authenticator, BearerToken, UserId,
};
use internlink::marketplace::admin::router::AdminRoutes;
use internlink::marketplace::admin::admin_router;
use internlink::marketplace::applications::router::ApplicationRoutes;
use internlink::marketplace::applications::application_router;
use internlink::marketplace::documents::router::DocumentRoutes;
use internlink::marketplace::documents::document_router;
use internlink::marketplace::notifications::router::NotificationRoutes;
use internlink::marketplace::notifications::notification_router;
use internlink::marketplace::postings::router::PostingRoutes;
use internlink::marketplace::postings::{posting_failure, posting_router, PostingService};
use internlink::marketplace::wishlist::router::WishlistRoutes;
use internlink::marketplace::wishlist::wishlist_router;

/// State for the endpoints the service adds beside the library routers.
pub(crate) struct ServiceRoutes {
    pub(crate) auth: Arc<AccountService<MemoryAccounts, MemorySessions>>,
    pub(crate) postings: Arc<PostingService<MemoryPostings, MemoryApplications, LiveNotifier>>,
    pub(crate) hub: Arc<LiveNotificationHub>,
}

/// Assemble the full marketplace surface: every feature router sharing the
/// account service as authenticator, the bulk import and live stream
/// endpoints, and the operational probes.
pub(crate) fn marketplace_router(market: Marketplace) -> Router {
    let auth = market.accounts.clone();
    let service_routes = Arc::new(ServiceRoutes {
        auth: auth.clone(),
        postings: market.postings.clone(),
        hub: market.hub.clone(),
    });

    auth_router(market.accounts.clone())
        .merge(posting_router(Arc::new(PostingRoutes {
            service: market.postings.clone(),
            auth: auth.clone(),
        })))
        .merge(application_router(Arc::new(ApplicationRoutes {
            service: market.applications(),
            auth: auth.clone(),
        })))
        .merge(wishlist_router(Arc::new(WishlistRoutes {
            service: market.wishlist(),
            auth: auth.clone(),
        })))
        .merge(document_router(Arc::new(DocumentRoutes {
            service: market.documents(),
            auth: auth.clone(),
        })))
        .merge(notification_router(Arc::new(NotificationRoutes {
            service: market.notifications.clone(),
            auth: auth.clone(),
        })))
        .merge(admin_router(Arc::new(AdminRoutes {
            service: market.admin(),
            auth,
        })))
        .merge(
            Router::new()
                .route("/api/v1/postings/import", post(import_postings_endpoint))
                .route(
                    "/api/v1/notifications/stream",
                    get(notification_stream_endpoint),
                )
                .with_state(service_routes),
        )
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportRequest {
    pub(crate) csv: String,
}

/// Bulk-create postings from an ATS spreadsheet export. Structural CSV
/// problems reject the whole request; per-row problems come back in
/// `skipped` alongside the created ids.
pub(crate) async fn import_postings_endpoint(
    State(state): State<Arc<ServiceRoutes>>,
    token: BearerToken,
    Json(request): Json<ImportRequest>,
) -> Response {
    let user = match state.auth.authenticate(&token.0) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let PostingImport { drafts, skipped } = match PostingCsvImporter::from_str(&request.csv) {
        Ok(import) => import,
        Err(error) => return AppError::Import(error).into_response(),
    };

    let today = Local::now().date_naive();
    match state.postings.bulk_create(&user, drafts, today) {
        Ok(created) => {
            let ids: Vec<_> = created.into_iter().map(|posting| posting.id).collect();
            (
                StatusCode::CREATED,
                Json(json!({ "created": ids, "skipped": skipped })),
            )
                .into_response()
        }
        Err(error) => posting_failure(error),
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StreamQuery {
    token: String,
}

/// Live notification feed. Browsers cannot set headers on a websocket
/// upgrade, so the session token rides in the query string.
pub(crate) async fn notification_stream_endpoint(
    State(state): State<Arc<ServiceRoutes>>,
    Query(query): Query<StreamQuery>,
    upgrade: WebSocketUpgrade,
) -> Response {
    let user = match state.auth.authenticate(&query.token) {
        Ok(user) => user,
        Err(error) => return auth_failure(error),
    };

    let feed = state.hub.subscribe(&user.id);
    upgrade.on_upgrade(move |socket| forward_notifications(socket, feed, user.id))
}

/// Forward each pushed notification as one JSON text frame. Clients only
/// listen on this stream; inbound frames other than close are ignored.
async fn forward_notifications(
    mut socket: WebSocket,
    mut feed: broadcast::Receiver<String>,
    user: UserId,
) {
    loop {
        tokio::select! {
            pushed = feed.recv() => match pushed {
                Ok(payload) => {
                    if socket.send(Message::Text(payload)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    debug!(user = %user.0, missed, "notification stream lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            inbound = socket.recv() => match inbound {
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }
}
