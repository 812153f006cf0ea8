//! Glyco Server - diabetes risk prediction API
//!
//! HTTP server exposing the prediction pipeline from glyco-core.

pub mod http;

use std::fmt;
use std::sync::{Arc, OnceLock};

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;

use glyco_core::{ConfigError, PredictionService, ServerConfig};

/// Lifecycle of the service; only ever moves forward
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Model artifacts are still loading
    Initializing,
    /// Serving predictions
    Ready,
}

impl Lifecycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Lifecycle::Initializing => "initializing",
            Lifecycle::Ready => "ready",
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared application state
///
/// The prediction service is set exactly once; there is no way back to
/// [`Lifecycle::Initializing`].
#[derive(Debug, Default)]
pub struct AppState {
    service: OnceLock<PredictionService>,
}

impl AppState {
    /// State with no model loaded yet
    pub fn initializing() -> Self {
        Self::default()
    }

    /// State that is ready from the start
    pub fn ready(service: PredictionService) -> Self {
        Self {
            service: OnceLock::from(service),
        }
    }

    /// Transition to [`Lifecycle::Ready`].
    ///
    /// Returns the service back if the state was already ready.
    pub fn mark_ready(&self, service: PredictionService) -> Result<(), PredictionService> {
        self.service.set(service)
    }

    pub fn lifecycle(&self) -> Lifecycle {
        if self.service.get().is_some() {
            Lifecycle::Ready
        } else {
            Lifecycle::Initializing
        }
    }

    /// The loaded service, if ready
    pub fn service(&self) -> Option<&PredictionService> {
        self.service.get()
    }
}

/// Build the CORS layer for the configured origin.
///
/// Without an origin every origin is allowed, which is only suitable for
/// development.
pub fn cors_layer(config: &ServerConfig) -> Result<CorsLayer, ConfigError> {
    match &config.allowed_origin {
        Some(origin) => {
            let origin = HeaderValue::from_str(origin).map_err(|e| ConfigError::Invalid {
                key: "server.allowed_origin",
                reason: e.to_string(),
            })?;
            Ok(CorsLayer::new()
                .allow_origin(origin)
                .allow_credentials(true)
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request()))
        }
        None => {
            tracing::warn!("No allowed origin configured, CORS allows any origin");
            Ok(CorsLayer::permissive())
        }
    }
}

/// Create the API router
pub fn create_router(state: Arc<AppState>, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(http::root))
        .route("/status", get(http::get_status))
        .route("/diabetes_prediction", post(http::diabetes_prediction))
        // Middleware
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %uuid::Uuid::new_v4(),
                )
            }),
        )
        .layer(cors)
        .with_state(state)
}

/// Start the server on an already bound listener
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing::info!("Glyco server listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
