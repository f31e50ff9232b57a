//! Domain types for the notify gateway.
//!
//! Configuration, error handling and the request/response bodies.

pub mod config;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{ConfigError, GatewayConfig, HttpConfig, LimitsConfig, TimeoutConfig};
pub use error::{ApiError, ApiResult, GatewayError};
pub use types::*;
