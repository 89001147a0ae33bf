//! Bookscan Server - Main entry point

use anyhow::{Context, Result};
use bookscan_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, time::Duration};
use tokio::signal;
use tracing::info;

use bookscan_server::{
    api, config::Config, db::Db, features::FeatureState, vision::VisionClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging with configuration from environment
    let mut log_config = LogConfig::from_env()?.with_file_prefix("bookscan-server");
    if log_config.filter_directives.is_none() {
        log_config = log_config
            .with_filter_directives("bookscan_server=debug,tower_http=debug,sqlx=warn");
    }
    init_logging(&log_config)?;

    info!("Starting Bookscan Server");

    // Load configuration
    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    // Initialize the database adapter. A connection or bootstrap failure is
    // fatal; the process must not start serving traffic without storage.
    let db = Db::connect(&config.database)
        .await
        .context("Failed to initialize database")?;

    // Vision client with an explicit request timeout
    let vision =
        VisionClient::new(config.vision.clone()).context("Failed to build vision client")?;
    info!(model = %config.vision.model, "Vision client initialized");

    // Create application state
    let state = FeatureState {
        db: db.clone(),
        vision,
        verbose_errors: !config.environment.is_production(),
    };

    // Build the application router
    let app = api::router(state, &config);

    // Create socket address
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Start server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    // Release backend connections; close is idempotent
    db.close().await;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // Give ongoing requests time to complete
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
