//! Resource setup for the `server` binary.
//!
//! 1. Connect to `PostgreSQL` with the configured pool limits
//! 2. Run the embedded migrations
//! 3. Build the email provider
//! 4. Wire [`AppState`]

use crate::config::Config;
use crate::email::build_provider;
use crate::server::AppState;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;
use tree_farm_core::token::InvalidLength;
use tree_farm_core::{EmailError, StoreError, SystemClock};
use tree_farm_postgres::PostgresBookingStore;

/// Errors that prevent the service from starting.
#[derive(Error, Debug)]
pub enum BootstrapError {
    /// Database connection failed
    #[error("Database connection failed: {0}")]
    Database(#[from] sqlx::Error),

    /// Migrations failed
    #[error("Store setup failed: {0}")]
    Store(#[from] StoreError),

    /// Email provider misconfigured
    #[error("Email provider error: {0}")]
    Email(#[from] EmailError),

    /// Token secret rejected
    #[error("Invalid token secret: {0}")]
    Secret(#[from] InvalidLength),
}

/// Connect to every backing resource and build the application state.
///
/// # Errors
///
/// Returns [`BootstrapError`] if the database is unreachable, migrations fail,
/// or the email provider cannot be configured.
pub async fn build_state(config: &Config) -> Result<AppState, BootstrapError> {
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.postgres.max_connections)
        .min_connections(config.postgres.min_connections)
        .acquire_timeout(Duration::from_secs(config.postgres.connect_timeout))
        .idle_timeout(Some(Duration::from_secs(config.postgres.idle_timeout)))
        .connect(&config.postgres.url)
        .await?;
    info!("✓ PostgreSQL connected");

    let store = PostgresBookingStore::new(pool);
    store.migrate().await?;
    info!("✓ Migrations complete");

    let email = build_provider(&config.email)?;
    info!(provider = ?config.email.provider, "✓ Email provider ready");

    Ok(AppState::new(
        Arc::new(store),
        email,
        Arc::new(SystemClock),
        config,
    )?)
}
