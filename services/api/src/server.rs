use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use belt_exam::config::AppConfig;
use belt_exam::error::AppError;
use belt_exam::registration::{CsvRosterFile, ExportPipeline, RegistrationExporter};
use belt_exam::telemetry;
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

    let roster = Arc::new(CsvRosterFile::new(config.export.roster_path.clone()));
    let exporter = Arc::new(RegistrationExporter::new(
        roster,
        ExportPipeline::new(config.export.clone()),
    ));

    let app = with_service_routes(exporter)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        roster = %config.export.roster_path.display(),
        ordering = ?config.export.ordering,
        "exam registration service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
