//! Scenario Cache - pre-generation machinery for investment scenario pages
//!
//! Serves the admin API over the scenario cache and optionally warms the
//! cache at startup.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scenario_cache::api::{create_router, AppState};
use scenario_cache::generation::StopHandle;
use scenario_cache::Config;

/// Main entry point for the scenario cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the scenario cache (starts its expiry sweep) and the pipeline
/// 4. Optionally start a background pre-generation run
/// 5. Serve the admin API on the configured port
/// 6. On SIGINT/SIGTERM stop pre-generation and destroy the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scenario_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting scenario cache service");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, ttl={}s, cleanup_interval={}s, port={}, locales={:?}",
        config.cache_max_size,
        config.cache_ttl,
        config.cleanup_interval,
        config.server_port,
        config.locales
    );

    let state = AppState::from_config(&config);
    info!(
        "Parameter grid initialized: ~{} scenarios per locale",
        state.pipeline.space().estimated_count()
    );

    let stop = state.pipeline.stop_handle();
    if config.pregenerate_on_start {
        let pipeline = state.pipeline.clone();
        let options = state.defaults.clone();
        tokio::spawn(async move {
            let result = pipeline.pre_generate_scenarios(&options).await;
            match serde_json::to_string(&result) {
                Ok(report) => info!("Startup pre-generation report: {}", report),
                Err(e) => warn!("Could not serialize pre-generation report: {}", e),
            }
        });
    }

    let scenarios = state.scenarios.clone();
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(stop))
        .await
        .context("server error")?;

    scenarios.destroy().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, asks any running pre-generation to stop so it
/// reports a partial result.
async fn shutdown_signal(stop: StopHandle) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    stop.stop();
    warn!("Pre-generation stop requested");
}
