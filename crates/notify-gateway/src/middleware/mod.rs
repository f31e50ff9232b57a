//! Middleware stack for the notify gateway.
//!
//! Layer order: Request → Tracing → Timeout → BodyLimit → Handler

pub mod tracing;

pub use self::tracing::{TracingLayer, REQUEST_ID_HEADER};

use crate::domain::config::GatewayConfig;
use axum::extract::DefaultBodyLimit;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::timeout::TimeoutLayer;

/// The layers every route is wrapped in
pub type MiddlewareStack =
    ServiceBuilder<Stack<DefaultBodyLimit, Stack<TimeoutLayer, Stack<TracingLayer, Identity>>>>;

/// Build the middleware stack from gateway config
pub fn middleware_stack(config: &GatewayConfig) -> MiddlewareStack {
    ServiceBuilder::new()
        .layer(TracingLayer::new())
        .layer(TimeoutLayer::new(config.timeouts.request))
        .layer(DefaultBodyLimit::max(config.limits.max_request_size))
}
