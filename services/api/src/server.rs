use crate::cli::ServeArgs;
use crate::infra::{
    view_gate, AppState, InMemorySettingsStore, InMemorySignalRepository, StaticSupplierDirectory,
};
use crate::routes::with_demand_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use demand_intel::config::AppConfig;
use demand_intel::error::AppError;
use demand_intel::intelligence::DemandIntelligenceService;
use demand_intel::telemetry;
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
        view_gate: Arc::new(view_gate(&config.access)),
    };

    let repository = Arc::new(InMemorySignalRepository::default());
    let settings = Arc::new(InMemorySettingsStore::default());
    let directory = Arc::new(StaticSupplierDirectory::default());
    let service = Arc::new(DemandIntelligenceService::new(
        repository, settings, directory,
    ));

    let app = with_demand_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "demand intelligence service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
