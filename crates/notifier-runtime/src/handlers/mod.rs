//! # Event Handlers
//!
//! The Subscriber Loop and the sinks it feeds.

pub mod sink;
pub mod subscriber_loop;

pub use sink::{EventSink, LogSink};
pub use subscriber_loop::{LoopExit, SubscriberLoop};
