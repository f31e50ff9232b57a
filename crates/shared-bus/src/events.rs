//! # Channel Events
//!
//! Defines what travels over the channel and what a subscription yields.

use serde::{Deserialize, Serialize};

/// A published event as observed by a subscriber.
///
/// The payload is opaque text; no identifier, timestamp or schema is imposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelEvent {
    /// Channel the event was delivered on.
    pub channel: String,
    /// The published text, verbatim.
    pub data: String,
}

impl ChannelEvent {
    /// Create a new event.
    pub fn new(channel: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            data: data.into(),
        }
    }
}

/// Everything a subscription can yield.
///
/// Brokers interleave their own control acknowledgments with data; only
/// [`BrokerMessage::Message`] carries a published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerMessage {
    /// The broker confirmed a subscription.
    Subscribed {
        /// Channel the subscription applies to.
        channel: String,
        /// Number of channels the connection is now subscribed to.
        active: usize,
    },

    /// The broker confirmed an unsubscription.
    Unsubscribed {
        /// Channel the subscription applied to.
        channel: String,
        /// Number of channels the connection is still subscribed to.
        active: usize,
    },

    /// A published event.
    Message(ChannelEvent),
}

impl BrokerMessage {
    /// Broker-level message type.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Subscribed { .. } => "subscribe",
            Self::Unsubscribed { .. } => "unsubscribe",
            Self::Message(_) => "message",
        }
    }

    /// Whether this message carries published data.
    #[must_use]
    pub fn is_data(&self) -> bool {
        matches!(self, Self::Message(_))
    }

    /// Channel this message refers to.
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            Self::Subscribed { channel, .. } | Self::Unsubscribed { channel, .. } => channel,
            Self::Message(event) => &event.channel,
        }
    }

    /// The carried event, or `None` for control messages.
    #[must_use]
    pub fn into_event(self) -> Option<ChannelEvent> {
        match self {
            Self::Message(event) => Some(event),
            Self::Subscribed { .. } | Self::Unsubscribed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_messages_carry_no_event() {
        let ack = BrokerMessage::Subscribed {
            channel: "task-events".into(),
            active: 1,
        };
        assert_eq!(ack.kind(), "subscribe");
        assert!(!ack.is_data());
        assert_eq!(ack.channel(), "task-events");
        assert!(ack.into_event().is_none());

        let bye = BrokerMessage::Unsubscribed {
            channel: "task-events".into(),
            active: 0,
        };
        assert_eq!(bye.kind(), "unsubscribe");
        assert!(bye.into_event().is_none());
    }

    #[test]
    fn test_data_message() {
        let msg = BrokerMessage::Message(ChannelEvent::new("task-events", "deploy-v1"));
        assert_eq!(msg.kind(), "message");
        assert!(msg.is_data());

        let event = msg.into_event().expect("data event");
        assert_eq!(event.channel, "task-events");
        assert_eq!(event.data, "deploy-v1");
    }

    #[test]
    fn test_event_serializes_as_plain_fields() {
        let event = ChannelEvent::new("task-events", "");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json, serde_json::json!({"channel": "task-events", "data": ""}));
    }
}
