//! # Channel Subscriber
//!
//! Defines the subscription side of the channel.

use crate::error::BusError;
use crate::events::{BrokerMessage, ChannelEvent};
use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::debug;

/// Trait for subscribing to a single, fixed channel.
#[async_trait]
pub trait ChannelSubscriber: Send + Sync {
    /// Name of the channel this subscriber is bound to.
    fn channel(&self) -> &str;

    /// Open a subscription to the channel.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Unreachable`] if the broker cannot be reached.
    async fn subscribe(&self) -> Result<Subscription, BusError>;
}

/// A subscription handle for receiving events.
///
/// Wraps a lazy, non-restartable stream of broker messages. Once the stream
/// reports its end (connection dropped, bus shut down) it never yields again.
pub struct Subscription {
    /// Channel name.
    channel: String,

    /// Underlying message stream.
    messages: BoxStream<'static, BrokerMessage>,

    /// Set once the underlying stream has ended.
    ended: bool,
}

impl Subscription {
    /// Create a new subscription over a message stream.
    pub fn new(channel: impl Into<String>, messages: BoxStream<'static, BrokerMessage>) -> Self {
        Self {
            channel: channel.into(),
            messages,
            ended: false,
        }
    }

    /// Channel this subscription listens on.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the subscription has reached end of stream.
    #[must_use]
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// Receive the next message, control acknowledgments included.
    ///
    /// # Returns
    ///
    /// - `Some(message)` - The next message in broker delivery order
    /// - `None` - The connection ended
    pub async fn next_message(&mut self) -> Option<BrokerMessage> {
        self.next().await
    }

    /// Receive the next published event, skipping control messages.
    ///
    /// # Returns
    ///
    /// - `Some(event)` - The next data event
    /// - `None` - The connection ended
    pub async fn next_event(&mut self) -> Option<ChannelEvent> {
        loop {
            match self.next_message().await? {
                BrokerMessage::Message(event) => return Some(event),
                control => {
                    debug!(channel = %self.channel, kind = control.kind(), "Skipping control message");
                }
            }
        }
    }
}

impl Stream for Subscription {
    type Item = BrokerMessage;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.ended {
            return Poll::Ready(None);
        }

        match this.messages.poll_next_unpin(cx) {
            Poll::Ready(None) => {
                this.ended = true;
                debug!(channel = %this.channel, "Subscription stream ended");
                Poll::Ready(None)
            }
            other => other,
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("channel", &self.channel)
            .field("ended", &self.ended)
            .finish_non_exhaustive()
    }
}
