mod api;
mod config;
mod db;
mod errors;
mod metrics;
mod models;
mod query;
mod resources;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::handlers::AppStateInner;
use api::routes::create_router;
use config::Config;
use resources::ResourceRegistry;

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Starting graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,modvault_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Mod Vault API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize metrics
    metrics::init_metrics();
    info!("Metrics registry initialized");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Connect to the database
    info!("Connecting to database...");
    let pool = db::create_pool(&config.database)
        .await
        .context("Failed to create database pool")?;

    db::test_connection(&pool)
        .await
        .context("Failed to test database connection")?;
    info!("Database connection established");

    // Run migrations
    db::schema::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // Seed the entity gauges
    if let Ok(count) = db::schema::get_mod_version_count(&pool).await {
        metrics::MOD_VERSIONS_TOTAL.set(count);
    }
    if let Ok(count) = db::schema::get_global_rating_count(&pool).await {
        metrics::GLOBAL_RATINGS_TOTAL.set(count);
    }

    // Create application state
    let state = Arc::new(AppStateInner {
        pool,
        registry: ResourceRegistry::new(),
        content: config.content.clone(),
        instance_id: config.server.instance_id.clone(),
    });

    // Create router
    let app = create_router(state);

    // Start server
    let addr = config.server_address();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server")?;

    info!("Server listening on {}", addr);

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");

    Ok(())
}
