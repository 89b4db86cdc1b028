//! Common error types for the relay

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Missing credential: {0}")]
    MissingCredential(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Remote call failed: {0}")]
    RemoteCall(String),

    #[error("Failed to generate {kind} after {attempts} attempt(s): {message}")]
    ImageGeneration {
        kind: String,
        attempts: u32,
        message: String,
    },

    #[error("{mode} batch aborted after {completed} image(s): {source}")]
    BatchAborted {
        mode: String,
        completed: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Image kind named by a generation failure, if any
    pub fn failed_kind(&self) -> Option<&str> {
        match self {
            AppError::ImageGeneration { kind, .. } => Some(kind.as_str()),
            AppError::BatchAborted { source, .. } => source.failed_kind(),
            _ => None,
        }
    }
}

/// Error response format (OpenAI compatible)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = match &self {
            AppError::Config(_) | AppError::MissingCredential(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "server_error", Some("misconfigured"))
            }
            AppError::HttpClient(_) => (StatusCode::BAD_GATEWAY, "backend_error", None),
            AppError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", None),
            AppError::RemoteCall(_) => (StatusCode::BAD_GATEWAY, "backend_error", None),
            AppError::ImageGeneration { .. } | AppError::BatchAborted { .. } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "server_error",
                Some("image_generation_failed"),
            ),
            AppError::RateLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "rate_limit_error", Some("rate_limit_exceeded")),
            AppError::Timeout(_) => (StatusCode::GATEWAY_TIMEOUT, "timeout_error", None),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: error_type.to_string(),
                code: code.map(|c| c.to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
