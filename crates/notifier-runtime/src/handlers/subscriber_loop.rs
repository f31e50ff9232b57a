//! # Subscriber Loop
//!
//! Long-running consumer of the task channel.
//!
//! ## Flow
//!
//! 1. Open one subscription on the channel
//! 2. Hand every data event to the sink, in delivery order
//! 3. Skip broker control acknowledgments
//! 4. Stop when the stream ends or shutdown is signalled
//!
//! A failed subscribe or a dropped connection ends the loop for good; nothing
//! here retries or reconnects.

use std::sync::Arc;

use shared_bus::{BrokerMessage, BusError, ChannelSubscriber};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use super::sink::EventSink;

/// Why the Subscriber Loop stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopExit {
    /// The subscription could not be opened.
    SubscribeFailed(BusError),
    /// The broker closed the stream.
    StreamEnded {
        /// Events handed to the sink before the end.
        delivered: u64,
    },
    /// Shutdown was signalled.
    Cancelled {
        /// Events handed to the sink before cancellation.
        delivered: u64,
    },
}

/// Consumes the channel and forwards data events to a sink.
pub struct SubscriberLoop {
    subscriber: Arc<dyn ChannelSubscriber>,
    sink: Arc<dyn EventSink>,
}

impl SubscriberLoop {
    /// Create a loop over `subscriber` writing to `sink`.
    pub fn new(subscriber: Arc<dyn ChannelSubscriber>, sink: Arc<dyn EventSink>) -> Self {
        Self { subscriber, sink }
    }

    /// Channel the loop consumes.
    pub fn channel(&self) -> &str {
        self.subscriber.channel()
    }

    /// Run until the stream ends or `shutdown` flips to `true`.
    ///
    /// If the shutdown sender is dropped the loop keeps consuming.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> LoopExit {
        let mut subscription = match self.subscriber.subscribe().await {
            Ok(subscription) => subscription,
            Err(e) => {
                error!(channel = self.channel(), error = %e, "Subscribe failed, loop exiting");
                return LoopExit::SubscribeFailed(e);
            }
        };
        info!("Subscribed to {} channel", subscription.channel());

        let mut delivered = 0u64;
        let mut watching = true;

        loop {
            if *shutdown.borrow() {
                info!(channel = self.channel(), delivered, "Subscriber Loop cancelled");
                return LoopExit::Cancelled { delivered };
            }

            tokio::select! {
                changed = shutdown.changed(), if watching => {
                    if changed.is_err() {
                        debug!(channel = self.channel(), "Shutdown signal dropped, loop abandoned");
                        watching = false;
                    }
                }
                message = subscription.next_message() => match message {
                    Some(BrokerMessage::Message(event)) => {
                        self.sink.observe(&event);
                        delivered += 1;
                    }
                    Some(control) => {
                        debug!(
                            channel = self.channel(),
                            kind = control.kind(),
                            "Ignoring control message"
                        );
                    }
                    None => {
                        warn!(channel = self.channel(), delivered, "Subscription ended, loop exiting");
                        return LoopExit::StreamEnded { delivered };
                    }
                },
            }
        }
    }
}
