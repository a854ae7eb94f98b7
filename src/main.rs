use std::time::Duration;

use anyhow::Result;
use tokio::{net::TcpListener, signal};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use air_quality_service::{
    api::{self, AppState},
    cache::TtlCache,
    config::Config,
    db,
    ingest::IngestService,
    simulator::{self, SensorSimulator},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env (ignore error if file absent — env vars may be set externally)
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;
    info!("Database ready");

    // One cache shared by the ingest write-through and the query paths.
    let cache = TtlCache::new();
    let state = AppState::new(pool.clone(), cache.clone());

    let shutdown = CancellationToken::new();

    if config.simulator_enabled {
        let ingest = IngestService::new(pool.clone(), cache.clone());
        let sim = SensorSimulator::new(config.simulator_sensor_id.clone());
        let interval = Duration::from_secs(config.simulator_interval_secs);
        tokio::spawn(simulator::run(sim, ingest, interval, shutdown.clone()));
    }

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = TcpListener::bind(&addr).await?;
    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    Ok(())
}

/// Resolves on SIGINT/SIGTERM and cancels the background simulator loop so
/// it stops cleanly alongside the HTTP server.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
    cancel.cancel();
}
