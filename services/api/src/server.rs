use crate::cli::ServeArgs;
use crate::infra::{build_catalog, build_upstreams, AppState};
use crate::routes::with_dealership_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use dealer_reviews::accounts::{AccountService, InMemoryUserStore};
use dealer_reviews::config::AppConfig;
use dealer_reviews::error::AppError;
use dealer_reviews::reviews::ReviewService;
use dealer_reviews::telemetry;
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

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let upstreams = build_upstreams(&config)?;
    let catalog = Arc::new(build_catalog(&config)?);
    let reviews = Arc::new(ReviewService::new(
        Arc::new(upstreams.dealers),
        Arc::new(upstreams.sentiment),
        catalog,
    ));
    let accounts = Arc::new(AccountService::new(Arc::new(
        InMemoryUserStore::with_session_ttl(config.session_ttl),
    )));

    let app = with_dealership_routes(reviews, accounts)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        dealership_url = %config.upstream.dealership_url,
        "dealership review service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
