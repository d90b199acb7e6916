//! SocialNet API server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use socialnet_api::config::AppConfig;
use socialnet_api::consumers::{self, Consumers};
use socialnet_api::error::AppError;
use socialnet_api::routes;
use socialnet_api::state::{self, AppState, Stores};
use socialnet_api::telemetry;
use socialnet_channel::InMemoryChannel;
use socialnet_core::clock::{Clock, SystemClock};
use socialnet_propagation::Publisher;
use socialnet_store::InMemoryObjectStorage;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Resolves on Ctrl+C or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl+C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}

async fn stores(config: &AppConfig) -> Result<Stores, AppError> {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("DATABASE_URL not set, using in-memory stores");
        return Ok(Stores::in_memory());
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(database_url)
        .await?;
    sqlx::migrate!("../../migrations").run(&pool).await?;
    info!("database migrations applied");
    Ok(Stores::postgres(&pool))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = AppConfig::from_env()?;
    let telemetry = telemetry::init_tracing(config.otlp_endpoint.as_deref())?;

    info!(exports_spans = telemetry.exports_spans(), "Starting SocialNet API server");

    // Build application state.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let channel = InMemoryChannel::with_system_channels();
    let publisher = Publisher::new(Arc::new(channel.clone()), Arc::clone(&clock));
    let stores = stores(&config).await?;
    let validator = state::build_validator(&config, &stores);
    let storage = Arc::new(InMemoryObjectStorage::new(config.object_base_url.clone()));
    let app_state = AppState::new(clock, stores, storage, publisher, validator);

    // Start consumers.
    let consumers = Consumers::new(&app_state);
    let workers = consumers
        .start(
            Arc::new(channel.clone()),
            consumers::recoverer(&app_state, config.retry_policy()),
        )
        .await?;
    let sweep = config
        .reconcile_interval
        .map(|period| consumers.spawn_orphan_sweep(&app_state, period));

    // TODO: Replace CorsLayer::permissive() with restricted origins for production.
    let app = routes::app(app_state).layer(CorsLayer::permissive());

    // Start server.
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Stop consumers once requests have drained.
    if let Some(sweep) = sweep {
        sweep.abort();
    }
    channel.close();
    workers.join().await;
    info!("consumers stopped");

    telemetry.shutdown();
    Ok(())
}
