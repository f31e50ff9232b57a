//! # Channel Publisher
//!
//! Defines the publishing side of the channel and the in-memory broker.

use crate::error::BusError;
use crate::events::{BrokerMessage, ChannelEvent};
use crate::subscriber::{ChannelSubscriber, Subscription};
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, warn};

/// Trait for publishing events to a single, fixed channel.
///
/// Publishing never depends on subscriber presence: a publish that reaches
/// nobody is still a successful publish.
#[async_trait]
pub trait ChannelPublisher: Send + Sync {
    /// Name of the channel this publisher is bound to.
    fn channel(&self) -> &str;

    /// Publish a message to the channel.
    ///
    /// # Arguments
    ///
    /// * `message` - The payload, forwarded verbatim
    ///
    /// # Returns
    ///
    /// The number of subscribers the broker delivered the message to.
    ///
    /// # Errors
    ///
    /// Returns a [`BusError`] if the broker is unreachable or refuses the publish.
    async fn publish(&self, message: &str) -> Result<usize, BusError>;

    /// Get the total number of messages accepted by the broker.
    fn events_published(&self) -> u64;
}

/// Broker state shared by every channel handle.
struct BusState {
    /// Whether the broker accepts connections.
    online: bool,

    /// Broadcast sender per channel name.
    senders: HashMap<String, broadcast::Sender<BrokerMessage>>,
}

struct BusInner {
    state: RwLock<BusState>,
    capacity: usize,
}

/// In-memory implementation of the broker.
///
/// Uses `tokio::sync::broadcast` for multi-producer, multi-consumer semantics.
/// Suitable for single-process operation and tests; distributed deployments
/// use `RedisChannel`.
#[derive(Clone)]
pub struct InMemoryEventBus {
    inner: Arc<BusInner>,
}

impl InMemoryEventBus {
    /// Create a new in-memory broker with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a new in-memory broker with specified per-subscriber capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(BusInner {
                state: RwLock::new(BusState {
                    online: true,
                    senders: HashMap::new(),
                }),
                capacity,
            }),
        }
    }

    /// Get a client bound to the named channel.
    #[must_use]
    pub fn channel(&self, name: impl Into<String>) -> InMemoryChannel {
        InMemoryChannel {
            name: name.into(),
            inner: Arc::clone(&self.inner),
            events_published: AtomicU64::new(0),
        }
    }

    /// Bring the broker up or down.
    ///
    /// Going offline makes every publish and subscribe fail with
    /// [`BusError::Unreachable`] and ends all live subscriptions. Coming back
    /// online does not revive ended subscriptions.
    pub fn set_online(&self, online: bool) {
        let mut state = self
            .inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        state.online = online;
        if !online {
            // Dropping the senders closes every receiver.
            let dropped = state.senders.len();
            state.senders.clear();
            warn!(channels = dropped, "In-memory broker went offline");
        } else {
            debug!("In-memory broker back online");
        }
    }

    /// Whether the broker currently accepts connections.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .online
    }

    /// Get the number of active subscribers on a channel.
    #[must_use]
    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .senders
            .get(channel)
            .map_or(0, broadcast::Sender::receiver_count)
    }

    /// Get the per-subscriber capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.inner.capacity
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// A client of [`InMemoryEventBus`] bound to one channel.
pub struct InMemoryChannel {
    /// Channel name.
    name: String,

    /// Shared broker state.
    inner: Arc<BusInner>,

    /// Total messages accepted through this client.
    events_published: AtomicU64,
}

impl InMemoryChannel {
    /// Name of the bound channel.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.name
    }

    fn offline_error(&self) -> BusError {
        BusError::Unreachable(format!("in-memory broker offline (channel {})", self.name))
    }
}

#[async_trait]
impl ChannelPublisher for InMemoryChannel {
    fn channel(&self) -> &str {
        &self.name
    }

    async fn publish(&self, message: &str) -> Result<usize, BusError> {
        let state = self
            .inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        if !state.online {
            return Err(self.offline_error());
        }

        self.events_published.fetch_add(1, Ordering::Relaxed);

        let receivers = match state.senders.get(&self.name) {
            Some(sender) => sender
                .send(BrokerMessage::Message(ChannelEvent::new(&self.name, message)))
                .unwrap_or(0),
            None => 0,
        };

        debug!(channel = %self.name, receivers, "Event published");
        Ok(receivers)
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChannelSubscriber for InMemoryChannel {
    fn channel(&self) -> &str {
        &self.name
    }

    async fn subscribe(&self) -> Result<Subscription, BusError> {
        let receiver = {
            let mut state = self
                .inner
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);

            if !state.online {
                return Err(self.offline_error());
            }

            let capacity = self.inner.capacity;
            state
                .senders
                .entry(self.name.clone())
                .or_insert_with(|| broadcast::channel(capacity).0)
                .subscribe()
        };

        debug!(channel = %self.name, "New subscription created");

        let ack = BrokerMessage::Subscribed {
            channel: self.name.clone(),
            active: 1,
        };

        let name = self.name.clone();
        let messages = BroadcastStream::new(receiver).filter_map(move |item| {
            let name = name.clone();
            async move {
                match item {
                    Ok(message) => Some(message),
                    Err(BroadcastStreamRecvError::Lagged(count)) => {
                        debug!(channel = %name, lagged = count, "Subscriber lagged, some events dropped");
                        None
                    }
                }
            }
        });

        Ok(Subscription::new(
            self.name.clone(),
            stream::once(async move { ack }).chain(messages).boxed(),
        ))
    }
}
