//! Warung API server binary.

use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use warung_api::{build_router, AppConfig, AppState};
use warung_db::{Database, DbConfig};
use warung_sync::RefreshScheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);

    info!("Starting Warung API server...");

    let db_config = DbConfig::new(config.database.path.clone())
        .max_connections(config.database.max_connections);
    let db = Database::new(db_config).await?;
    info!(path = %config.database.path.display(), "Database ready");

    let addr = config.server.bind_address();
    let refresh_every = config.refresh_interval();
    let state = AppState::new(db.clone(), config)?;

    let platforms = state.refresher.platforms();
    let scheduler = if platforms.is_empty() {
        None
    } else {
        info!(?platforms, every = ?refresh_every, "Starting marketplace token refresh");
        Some(RefreshScheduler::spawn(state.refresher.clone(), refresh_every))
    };

    let app = build_router(state);
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(scheduler) = scheduler {
        scheduler.shutdown().await;
    }
    db.close().await;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if config.logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
