//! Glyco Server Binary
//!
//! Standalone server for the diabetes risk prediction API.

use std::sync::Arc;

use glyco_core::{GlycoConfig, PredictionService};
use glyco_server::{cors_layer, create_router, serve, AppState};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info")),
        )
        .init();

    let (config, source) = GlycoConfig::load()?;
    match &source {
        Some(path) => tracing::info!("Loaded configuration from {:?}", path),
        None => tracing::info!("Using default configuration"),
    }

    let state = Arc::new(AppState::initializing());
    let app = create_router(Arc::clone(&state), cors_layer(&config.server)?);
    let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
    let server = tokio::spawn(serve(listener, app));

    // Requests are answered with 503 until the artifacts are in place
    let model = config.model.clone();
    let loaded = tokio::task::spawn_blocking(move || PredictionService::load(&model)).await?;
    match loaded {
        Ok(service) => {
            if state.mark_ready(service).is_err() {
                return Err("prediction service was already initialized".into());
            }
            tracing::info!("Service ready");
        }
        Err(e) => {
            tracing::error!("Failed to load model or scaler: {}", e);
            server.abort();
            return Err(e.into());
        }
    }

    server.await?
}
