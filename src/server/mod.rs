//! HTTP proxy between ABACUS clients and the upstream model.
//!
//! Routes:
//! - `GET /` and `GET /health` report liveness
//! - `POST /ask` answers one question in the default style
//! - `POST /api/chat` streams a reply to a conversation using the
//!   data-stream line protocol (see [`crate::data_stream`])

pub mod error;
mod routes;

pub use error::{GENERIC_ERROR, Result, ServerError};
pub use routes::{AskRequest, AskResponse, ChatData, ChatRequest};

use crate::ai::providers::ModelProvider;
use crate::config::ServerConfig;
use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared state handed to every route.
pub struct AppState<P: ?Sized> {
    pub provider: Arc<P>,
    pub max_duration: Duration,
}

impl<P: ?Sized> Clone for AppState<P> {
    fn clone(&self) -> Self {
        Self {
            provider: Arc::clone(&self.provider),
            max_duration: self.max_duration,
        }
    }
}

impl<P: ?Sized> AppState<P> {
    pub fn new(provider: Arc<P>, max_duration: Duration) -> Self {
        Self {
            provider,
            max_duration,
        }
    }
}

fn cors_layer(allowed_origins: Option<&[String]>) -> CorsLayer {
    let Some(origins) = allowed_origins else {
        return CorsLayer::permissive();
    };

    let parsed: std::result::Result<Vec<HeaderValue>, _> =
        origins.iter().map(|s| s.parse()).collect();
    match parsed {
        Ok(origins) => CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(err) => {
            tracing::warn!("Invalid ALLOWED_ORIGINS entry ({err}), allowing any origin");
            CorsLayer::permissive()
        }
    }
}

pub fn build_router<P>(state: AppState<P>, allowed_origins: Option<&[String]>) -> Router
where
    P: ModelProvider + ?Sized + 'static,
{
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/ask", post(routes::ask::<P>))
        .route("/api/chat", post(routes::chat::<P>))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
}

/// Binds `config.bind_addr` and serves until Ctrl-C.
pub async fn serve<P>(config: &ServerConfig, provider: Arc<P>) -> Result<()>
where
    P: ModelProvider + ?Sized + 'static,
{
    let listener = TcpListener::bind(config.bind_addr).await.map_err(|e| {
        ServerError::config_error(format!("Failed to bind to {}: {}", config.bind_addr, e))
    })?;
    serve_on(listener, config, provider, shutdown_signal()).await
}

/// Serves on an already bound listener until `shutdown` resolves.
pub async fn serve_on<P, F>(
    listener: TcpListener,
    config: &ServerConfig,
    provider: Arc<P>,
    shutdown: F,
) -> Result<()>
where
    P: ModelProvider + ?Sized + 'static,
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr()?;
    let state = AppState::new(provider, config.max_duration);
    let router = build_router(state, config.allowed_origins.as_deref());

    tracing::info!(%addr, max_duration = ?config.max_duration, "abacus proxy listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await?;
    tracing::info!("abacus proxy shut down gracefully");
    Ok(())
}

pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl-C, shutting down"),
        Err(err) => tracing::error!("Failed to listen for Ctrl-C: {err}"),
    }
}
