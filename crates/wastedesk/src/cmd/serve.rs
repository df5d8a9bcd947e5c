//! Serve command - Run the HTTP server

use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use wastedesk_api::{AppState, GuardSettings, build_router};
use wastedesk_config::Config;

use super::{init_backend, load_config};

/// Run the serve command
pub async fn run(config_path: Option<PathBuf>) -> Result<()> {
    let config_label = config_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(default)".to_string());

    info!(
        version = env!("CARGO_PKG_VERSION"),
        config = %config_label,
        "Wastedesk starting"
    );

    let config = load_config(config_path)?;

    if let Err(e) = run_server(config).await {
        error!(error = %e, "server error");
        return Err(e);
    }

    info!("Wastedesk shutdown complete");
    Ok(())
}

/// Main server run loop
async fn run_server(config: Config) -> Result<()> {
    let cancel = CancellationToken::new();

    let backend = init_backend(&config).await?;
    if !backend.seed.is_noop() {
        info!(
            permissions = backend.seed.permissions_created,
            roles = backend.seed.roles_created,
            grants = backend.seed.grants_created,
            "canonical permissions seeded"
        );
    }
    if config.bootstrap.admin_credentials().is_none() {
        warn!("no bootstrap admin configured");
    }

    let settings = GuardSettings {
        min_level: config.auth.min_level,
        permission_timeout: config.auth.permission_timeout,
    };
    let state = AppState::new(backend.auth, settings);

    let app = build_router(state).layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    );

    let addr = config.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(
        addr = %addr,
        algorithm = config.auth.algorithm.as_str(),
        min_level = config.auth.min_level,
        "HTTP server listening"
    );

    let server_cancel = cancel.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                server_cancel.cancelled().await;
            })
            .await
    });

    wait_for_shutdown().await;
    info!("shutdown signal received, stopping server...");
    cancel.cancel();

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(error = %e, "server stopped with error"),
        Err(e) => warn!(error = %e, "server task panicked during shutdown"),
    }

    backend.database.close().await;
    Ok(())
}

/// Wait for SIGINT or SIGTERM
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
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
}
