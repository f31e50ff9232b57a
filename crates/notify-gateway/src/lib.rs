// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Notify Gateway - HTTP surface of the task notifier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  NOTIFY GATEWAY                      │
//! ├──────────────────────────────────────────────────────┤
//! │   GET /ping               POST /notify?message=...   │
//! │       │                           │                  │
//! │  ┌────┴───────────────────────────┴────┐             │
//! │  │          Middleware Stack           │             │
//! │  │   Tracing → Timeout → BodyLimit     │             │
//! │  └────┬───────────────────────────┬────┘             │
//! │       │                           │                  │
//! │   HealthRest                  NotifyRest             │
//! │   (no broker)                     │                  │
//! └───────────────────────────────────┼──────────────────┘
//!                                     │ publish()
//!                                     ▼
//!                          ChannelPublisher ("task-events")
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use notify_gateway::{GatewayConfig, NotifyGatewayService};
//!
//! let service = NotifyGatewayService::new(GatewayConfig::default(), publisher)?;
//! let listener = service.bind().await?;
//! service.serve(listener, shutdown_signal).await?;
//! ```
//!
//! # Error Model
//!
//! - Missing `message` → 422
//! - Broker unreachable → 503
//! - Broker refused the publish → 502

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod service;

// Re-exports for public API
pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use domain::types::*;
pub use router::{build_router, AppState};
pub use service::NotifyGatewayService;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
