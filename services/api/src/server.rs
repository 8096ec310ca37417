use crate::cli::ServeArgs;
use crate::infra::{resolve_classifier, AppState, InMemorySessionRepository, Recommender};
use crate::routes::with_diagnosis_routes;
use aura_diagnosis::config::AppConfig;
use aura_diagnosis::diagnosis::DiagnosisService;
use aura_diagnosis::error::AppError;
use aura_diagnosis::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
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

    let classifier = resolve_classifier(args.definition.definition.as_deref(), &config.diagnosis)?;
    let recommender = Recommender::from_config(&config.recommendation)?;
    let diagnosis_service = Arc::new(DiagnosisService::new(
        Arc::new(classifier),
        Arc::new(InMemorySessionRepository::default()),
        Arc::new(recommender),
    ));

    let app = with_diagnosis_routes(diagnosis_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "aura diagnosis service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
