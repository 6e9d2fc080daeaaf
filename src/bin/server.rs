use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use siteverif::config::ServerConfig;
use siteverif::server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = ServerConfig::from_env();
    let addr = format!("0.0.0.0:{}", config.port);
    let state = Arc::new(AppState::new(config));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", addr, e))?;
    info!("serveur demarre sur http://localhost:{}", listener.local_addr().map(|a| a.port()).unwrap_or(0));
    info!("ouvrez cette adresse dans votre navigateur");

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))
}
