use crate::cli::ServeArgs;
use crate::infra::{AppState, Marketplace};
use crate::routes::marketplace_router;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use internlink::config::AppConfig;
use internlink::error::AppError;
use internlink::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let marketplace = Marketplace::new(&config.sessions, &config.uploads);
    if let Some(bootstrap) = &config.admin {
        let admin = marketplace
            .accounts
            .provision_admin(&bootstrap.email, &bootstrap.password)
            .map_err(AppError::Bootstrap)?;
        info!(admin = %admin.email, "administrator account provisioned");
    }

    let app = marketplace_router(marketplace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "internship marketplace api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
