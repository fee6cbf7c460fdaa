//! Axum API server binary.

use std::net::SocketAddr;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stitch_api::{create_router, metrics, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env();

    // Colored output for dev, JSON for production
    let log_format = std::env::var("LOG_FORMAT").ok();
    let use_json = config.use_json_logs(log_format.as_deref());

    let env_filter = EnvFilter::from_default_env().add_directive("stitch=info".parse()?);

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }

    info!("Starting stitch-api");
    info!(
        "API config: host={}, port={}, environment={}",
        config.host, config.port, config.environment
    );

    let state = match AppState::from_env(config.clone()) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create application state: {}", e);
            std::process::exit(1);
        }
    };

    let metrics_handle = if config.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder, metrics disabled: {}", e);
                None
            }
        }
    } else {
        None
    };

    let app = create_router(state, metrics_handle);

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.bind_address()))?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}
