use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use tokio::net::TcpListener;

use nhtc_backend::core::config::{AppPaths, ConfigService};
use nhtc_backend::core::logging;
use nhtc_backend::server::router::router;
use nhtc_backend::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());

    let config_service = ConfigService::new(paths.clone());
    let loaded = config_service
        .load_config()
        .with_context(|| format!("Failed to load {}", config_service.config_path().display()))?;
    let config = loaded.config;
    logging::init(&paths.log_dir, &config.server.log_level);
    for warning in &loaded.warnings {
        tracing::warn!("{}", warning);
    }

    let state = AppState::initialize(paths, config)
        .await
        .context("Failed to initialize application state")?;

    tracing::info!("Initializing knowledge index from {}", state.loader.data_dir().display());
    match state.index.ensure_built(&state.loader).await {
        Ok(count) => tracing::info!("Knowledge index ready with {} documents", count),
        Err(err) => tracing::error!("Failed to build knowledge index: {}", err),
    }

    let bind_addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;

    println!("NHTC_PORT={}", addr.port());
    tracing::info!("Listening on {}", addr);

    let app: Router = router(state);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
