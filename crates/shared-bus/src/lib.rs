//! # Shared Bus - Channel Client for the Task Notifier
//!
//! Defines the publish/subscribe contract the notifier depends on, plus the
//! broker adapters that fulfil it.
//!
//! ## Channel Model
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────────┐
//! │ HTTP caller  │                    │ Subscriber Loop  │
//! │              │    publish()       │                  │
//! │              │ ──────┐            │                  │
//! └──────────────┘       │            └──────────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐           │
//!                  │    Broker    │           │
//!                  │ "task-events"│ ──────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! ## Delivery
//!
//! - **Best effort:** no persistence, no acknowledgment, no replay
//! - **Fan-out:** every subscriber connected at publish time receives the event
//! - **Publisher independence:** publishing with zero subscribers is not an error
//!
//! ## Adapters
//!
//! - [`InMemoryEventBus`]: single-process broker on `tokio::sync::broadcast`
//! - `RedisChannel` (feature `redis`): Redis `PUBLISH`/`SUBSCRIBE`

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod error;
pub mod events;
pub mod publisher;
pub mod subscriber;

#[cfg(feature = "redis")]
pub mod redis;

// Re-export main types
pub use error::BusError;
pub use events::{BrokerMessage, ChannelEvent};
pub use publisher::{ChannelPublisher, InMemoryChannel, InMemoryEventBus};
pub use subscriber::{ChannelSubscriber, Subscription};

#[cfg(feature = "redis")]
pub use crate::redis::RedisChannel;

/// The channel shared by the publish and subscribe sides.
///
/// Matching is exact and case-sensitive; a publisher bound to any other
/// name never reaches the subscriber loop.
pub const TASK_EVENTS_CHANNEL: &str = "task-events";

/// Maximum events to buffer per in-memory subscriber before it lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
