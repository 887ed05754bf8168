//! Tree-farm booking HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Start PostgreSQL
//! docker compose up -d
//!
//! # Run server
//! cargo run -p tree-farm-booking --bin server
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tree_farm_booking::{Config, bootstrap, build_router, metrics};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tree_farm_booking=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🎄 Starting tree-farm booking server...");

    // Load configuration
    let config = Config::from_env();
    info!(
        addr = %config.server_addr(),
        email_provider = ?config.email.provider,
        auto_confirm = config.booking.auto_confirm,
        "Configuration loaded"
    );

    // Metrics exporter
    match config.metrics_addr().parse::<SocketAddr>() {
        Ok(metrics_addr) => {
            PrometheusBuilder::new()
                .with_http_listener(metrics_addr)
                .install()?;
            metrics::register_business_metrics();
            info!(addr = %metrics_addr, "Metrics available at http://{metrics_addr}/metrics");
        }
        Err(e) => warn!(error = %e, "Invalid metrics address, metrics disabled"),
    }

    // Resources and router
    let state = bootstrap::build_state(&config).await?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server_addr()).await?;
    info!(address = %config.server_addr(), "Server listening");

    // Run server with graceful shutdown, bounded by SHUTDOWN_TIMEOUT once signaled
    let shutdown_timeout = Duration::from_secs(config.server.shutdown_timeout);
    let (signaled_tx, signaled_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = signaled_tx.send(());
    });
    let mut server = tokio::spawn(async move { server.await });

    let result = tokio::select! {
        result = &mut server => result,
        _ = signaled_rx => match tokio::time::timeout(shutdown_timeout, &mut server).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?shutdown_timeout, "Graceful shutdown timed out, dropping open connections");
                server.abort();
                return Ok(());
            }
        },
    };
    result??;

    info!("Server stopped");
    Ok(())
}

/// Wait for a shutdown signal.
///
/// Waits for:
/// - Ctrl+C (SIGINT)
/// - SIGTERM (in production environments)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C signal, shutting down gracefully...");
        },
        () = terminate => {
            info!("Received SIGTERM signal, shutting down gracefully...");
        },
    }
}
