use anyhow::Context;
use diagram_collab_server::config::ServerConfig;
use diagram_collab_server::middleware::init_tracing;
use diagram_collab_server::routes::{AppState, create_router, init_storage};
use diagram_collab_server::services::HttpAuthenticator;
use std::sync::Arc;
use tracing::info;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {}", e))?;
    info!("Application starting...");

    let store = init_storage(&config)
        .await
        .context("failed to open document store")?;
    let authenticator = HttpAuthenticator::new(&config.auth_service_url)
        .context("invalid authentication service url")?;
    info!("Authenticating against {}", authenticator.users_url());

    let app_state = AppState::new(store, Arc::new(authenticator), &config);
    let app = create_router(app_state, &config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on {}", addr);
    info!("Health check available at http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

// Handle both SIGINT (Ctrl+C) and SIGTERM (Docker stop)
#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            tracing::warn!("Failed to install SIGTERM handler: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            info!("SIGINT received, shutting down gracefully");
            return;
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("SIGINT received, shutting down gracefully");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received, shutting down gracefully");
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
