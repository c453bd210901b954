//! Campus - Main Entry Point

use campus_api::{build_router, ApiState, ServerConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Campus v{}", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "/etc/campus/server.json".into());

    let config = ServerConfig::load(&config_path)
        .unwrap_or_else(|_| {
            tracing::warn!("Config not found, using defaults");
            ServerConfig::default()
        })
        .with_env();

    let bind = config.bind.clone();
    let state = ApiState::new(config)?;
    state.bootstrap_admin()?;

    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!("Listening on {}", bind);
    axum::serve(listener, build_router(state)).await?;

    Ok(())
}
