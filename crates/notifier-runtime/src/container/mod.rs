//! # Runtime Container
//!
//! Process-level configuration shared by the gateway, the broker channels and
//! the Subscriber Loop.

pub mod config;

pub use config::{BrokerConfig, ConfigError, LogConfig, NotifierConfig, SubscriberConfig};
