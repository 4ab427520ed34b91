use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryLedger, InMemoryListingRepository};
use crate::routes::with_listing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate::config::AppConfig;
use estate::error::AppError;
use estate::telemetry;
use estate::workflows::listings::ListingService;
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

    let repository = Arc::new(InMemoryListingRepository::default());
    let ledger = Arc::new(InMemoryLedger::default());
    let listing_service = Arc::new(ListingService::new(
        repository,
        ledger,
        config.sales.clone(),
    ));

    let app = with_listing_routes(listing_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        invoicing = config.sales.invoicing_enabled,
        offer_deletion = ?config.sales.offer_deletion,
        "listing service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
