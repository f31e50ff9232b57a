//! Gateway error types and their HTTP rendering.
//!
//! Every failure reaches the caller as a non-success status with a JSON body
//! of the form `{"error": "<description>"}`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shared_bus::BusError;
use std::fmt;

/// API error returned to HTTP callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// HTTP status code
    pub status: StatusCode,
    /// Error message
    pub message: String,
}

impl ApiError {
    /// Create a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Invalid parameters - missing or undecodable input
    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("Invalid params: {}", details.into()),
        )
    }

    /// Broker could not be reached
    pub fn broker_unavailable(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            format!("Broker unavailable: {}", details.into()),
        )
    }

    /// Broker refused the request
    pub fn broker_rejected(details: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_GATEWAY,
            format!("Broker rejected publish: {}", details.into()),
        )
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

/// Body shape of every error response
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: &self.message,
        });
        (self.status, body).into_response()
    }
}

// Conversions from common error types

impl From<BusError> for ApiError {
    fn from(e: BusError) -> Self {
        match e {
            BusError::Unreachable(details) => ApiError::broker_unavailable(details),
            BusError::Closed => ApiError::broker_unavailable("event bus closed"),
            BusError::Rejected(details) => ApiError::broker_rejected(details),
        }
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// Gateway-level errors (not returned to callers)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Server socket bind error
    #[error("server bind error on {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Server stopped with an IO error
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}
