use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemorySubmissionSink};
use crate::routes::with_qualification_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use finance_qualify::config::AppConfig;
use finance_qualify::error::AppError;
use finance_qualify::telemetry;
use finance_qualify::workflows::qualification::QualificationService;
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

    let sink = Arc::new(InMemorySubmissionSink::default());
    let qualification_service = Arc::new(QualificationService::new(
        sink,
        config.qualification.evaluation_config(),
    ));

    let app = with_qualification_routes(qualification_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        minimum_down_payment_ratio = config.qualification.minimum_down_payment_ratio,
        "buyer qualification service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
