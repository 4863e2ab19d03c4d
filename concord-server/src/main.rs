//! Concord Server - Headless Daemon
//!
//! Keeps game-server state (bans, mutes, permission groups, nicknames,
//! presence) and a Discord guild in agreement:
//! - Platform listeners report changes on `POST /api/notify`
//! - Operators resync on demand (`POST /api/resync`, `concord resync`)
//! - A timer resyncs online players periodically
//!
//! Access via: http://localhost:8046

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

mod api;
mod cli;
mod commands;
mod scheduler;
mod state;
#[cfg(test)]
mod test_helpers;

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => concord_core::config::config_path()?,
    };

    match cli.command {
        None => serve(&cli.log_level, config_path, None).await,
        Some(Commands::Serve { port }) => serve(&cli.log_level, config_path, port).await,
        Some(Commands::Resync { identity, kind, json }) => {
            let _guard = concord_core::logging::init_logging(&cli.log_level, None)?;
            commands::handle_resync(&config_path, identity, &kind, json).await
        },
        Some(Commands::Config(cmd)) => commands::handle_config_command(&config_path, cmd),
    }
}

async fn serve(log_level: &str, config_path: PathBuf, port: Option<u16>) -> Result<()> {
    let log_dir = concord_core::config::get_data_dir()?.join("logs");
    let _guard = concord_core::logging::init_logging(log_level, Some(&log_dir))?;
    concord_core::metrics::init_metrics();

    info!("🚀 Concord Server {} starting...", env!("GIT_VERSION"));

    let config = commands::load_config(&config_path)?;
    if !config.any_module_enabled() {
        tracing::warn!("⚠️ No sync module is enabled in {}", config_path.display());
    }
    let host = config.server.host.clone();
    let port = port.unwrap_or(config.server.port);

    let engine = state::build_engine(config)?;
    let state = AppState::new(engine, config_path);
    info!("✅ Sync engine initialized");

    scheduler::start_timer(state.clone());
    scheduler::start_guard_cleanup(state.clone());

    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid bind address '{}:{}'", host, port))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("🌐 Server listening on http://{}", addr);
    info!("🔌 API available at http://{}/api/", addr);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    info!("👋 Concord Server stopped");
    Ok(())
}

pub(crate) fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api::router(&state))
        .route("/health", get(api::health_check))
        .route("/healthz", get(api::health_check))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("🛑 Received Ctrl+C, initiating graceful shutdown..."),
        () = terminate => info!("🛑 Received SIGTERM, initiating graceful shutdown..."),
    }
}
