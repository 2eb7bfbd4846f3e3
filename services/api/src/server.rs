use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryFollowStore, InMemoryLocatorDirectory, InMemoryRoleDirectory};
use crate::routes::with_followup_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use study_follow::config::AppConfig;
use study_follow::error::AppError;
use study_follow::telemetry;
use study_follow::workflows::followup::FollowUpService;
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

    let store = Arc::new(InMemoryFollowStore::default());
    let directory = Arc::new(InMemoryLocatorDirectory::default());
    let roles = Arc::new(InMemoryRoleDirectory::permissive());
    let service = Arc::new(FollowUpService::new(store, directory, roles));

    let app = with_followup_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "follow-up service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
