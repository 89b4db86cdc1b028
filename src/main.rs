//! Main entry point for the FORGE image relay

use forge_relay::{
    api,
    backend::{
        analytics::AnalyticsClient,
        openai::OpenAiImageClient,
        traits::{AnalyticsSource, ImageGenerator},
    },
    config::Settings,
    dispatch::{DispatchConfig, Dispatcher},
    stats::{RefreshScheduler, StatsQueries, StatsRefresher, StatsStore},
    AppError, AppState,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    // Load configuration
    let settings = Settings::load()?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));
    let registry = tracing_subscriber::registry().with(filter);
    if settings.logging.format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }

    info!("Starting FORGE image relay");

    // A missing image key is fatal: refuse to serve traffic
    settings.validate()?;
    let image_key = settings
        .image_api_key()
        .ok_or_else(|| AppError::MissingCredential("OPENAI_API_KEY is required".to_string()))?;

    info!(
        host = %settings.server.host,
        port = settings.server.port,
        model = %settings.image_api.model,
        "Loaded configuration"
    );

    // Image dispatch
    let generator: Arc<dyn ImageGenerator> =
        Arc::new(OpenAiImageClient::new(&settings.image_api, image_key)?);
    let dispatcher = Arc::new(Dispatcher::new(
        generator,
        DispatchConfig::from(&settings.image_api),
    ));

    // Stats
    let analytics: Option<Arc<dyn AnalyticsSource>> = match settings.analytics_api_key() {
        Some(key) => Some(Arc::new(AnalyticsClient::new(&settings.analytics, key)?)),
        None => {
            warn!("Analytics API key missing, stats will stay zero-valued");
            None
        }
    };
    let stats = Arc::new(StatsStore::new());
    let refresher = Arc::new(StatsRefresher::new(
        analytics,
        StatsQueries::from(&settings.analytics),
        stats.clone(),
    ));

    // Best-effort initial refresh, then hand over to the recurring task
    refresher
        .refresh_best_effort(Duration::from_millis(settings.analytics.startup_timeout_ms))
        .await;
    let scheduler = RefreshScheduler::new(refresher.clone());
    scheduler
        .start(Duration::from_secs(settings.analytics.refresh_interval_secs))
        .await;

    let addr = format!("{}:{}", settings.server.host, settings.server.port);

    let app_state = Arc::new(AppState {
        settings: Arc::new(settings),
        dispatcher,
        refresher,
        stats,
    });

    // Build the router
    let app = api::routes::create_router(app_state);

    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("FORGE image relay shut down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
