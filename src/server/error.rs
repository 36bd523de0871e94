//! Error types for the proxy server.

use crate::ai::ChatError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Message shown to clients for any pre-stream failure; details go alongside.
pub const GENERIC_ERROR: &str = "An unexpected error occurred. Please try again later.";

pub type Result<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    /// Upstream model failed before producing output
    #[error(transparent)]
    Provider(#[from] ChatError),

    #[error("upstream model did not respond within {0:?}")]
    Timeout(Duration),

    #[error("no model provider configured. Set LLM_ENDPOINT, OPENAI_API_KEY, ANTHROPIC_API_KEY, or LLM_USE_OLLAMA=true")]
    NoProvider,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServerError {
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Every failure before the first byte is reported the same way; the
    /// cause travels in `details`.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        tracing::error!(context = "API_ROUTE_ERROR", error = %self, error_debug = ?self, "request failed");
        let body = Json(json!({
            "error": GENERIC_ERROR,
            "details": self.to_string(),
        }));
        (self.status_code(), body).into_response()
    }
}
