use crate::cli::ServeArgs;
use crate::infra::{seed_periods, seed_sample_catalog, AppState, Marketplace};
use crate::routes::with_marketplace_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use classifieds::clock::SystemClock;
use classifieds::config::{AppConfig, AppEnvironment};
use classifieds::error::AppError;
use classifieds::telemetry;
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

    let marketplace = Marketplace::from_config(&config, Arc::new(SystemClock));
    if config.environment == AppEnvironment::Development && !args.no_seed {
        let sample = seed_sample_catalog(&marketplace.store, &marketplace.catalog)?;
        info!(category_id = %sample.laptops.id, "sample catalog seeded");
    } else {
        seed_periods(&marketplace.store)?;
    }

    let app = with_marketplace_routes(&marketplace)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        assist_enabled = config.assist.api_key.is_some(),
        "classifieds marketplace ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
