//! # Event Sink
//!
//! Destination for events observed by the Subscriber Loop.

use shared_bus::ChannelEvent;
use tracing::info;

/// Receives every data event, in delivery order, one at a time.
pub trait EventSink: Send + Sync {
    /// Observe one event.
    fn observe(&self, event: &ChannelEvent);
}

/// Sink that writes each event to the process log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn observe(&self, event: &ChannelEvent) {
        info!(channel = %event.channel, "Received message: {}", event.data);
    }
}
