use std::sync::Arc;

use axum::http::header::CONTENT_TYPE;
use axum::http::Method;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use internlink::board::router::JobRoutes;
use internlink::board::{job_router, JobBoardService};
use internlink::config::AppConfig;
use internlink::error::AppError;
use internlink::telemetry;

use crate::infra::MemoryJobs;

pub(crate) async fn run() -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let app = board_app();

    let addr = config.board_socket_addr()?;
    let listener = TcpListener::bind(addr).await?;

    info!(?config.environment, %addr, "job board ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("job board stopped");
    Ok(())
}

/// Board routes plus the health probe. The catalog is open to everyone, so
/// the whole surface sits behind a browser-friendly CORS layer.
pub(crate) fn board_app() -> Router {
    let service = Arc::new(JobBoardService::new(Arc::new(MemoryJobs::default())));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE]);

    job_router(Arc::new(JobRoutes { service }))
        .route("/health", get(healthcheck))
        .layer(cors)
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("install terminate handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
