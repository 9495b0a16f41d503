//! Skyfight Server - relay server for the multiplayer jet arena
//!
//! This is the main entry point for the game server. It handles:
//! - WebSocket connections for real-time play
//! - The arena task holding players, coins and buildings
//! - Static file serving for the browser client

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skyfight::app::AppState;
use skyfight::config::Config;
use skyfight::http::build_router;
use skyfight::util::time::init_server_time;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize tracing
    init_tracing(&config.log_level);

    // Initialize server time tracking
    init_server_time();

    info!("Starting Skyfight Server");
    info!("Server address: {}", config.server_addr);

    // Create application state
    let (state, arena) = AppState::new(config.clone());

    // Spawn the arena task
    let arena_task = tokio::spawn(arena.run());

    // Build router
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    info!("Static client: {}", config.static_dir.display());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    arena_task.abort();

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        park_on_error("Ctrl+C", tokio::signal::ctrl_c().await).await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => park_on_error("SIGTERM", Err(e)).await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}

/// Return once a signal arrived; if its handler could not be installed, log
/// and never return so the other shutdown path stays in charge
async fn park_on_error(signal: &str, result: std::io::Result<()>) {
    if let Err(e) = result {
        error!(signal, error = %e, "Failed to install signal handler");
        std::future::pending::<()>().await;
    }
}
