//! # Redis Channel
//!
//! Redis-backed channel client (`PUBLISH` / `SUBSCRIBE`).
//!
//! The publish side keeps one multiplexed connection and reuses it across
//! calls; the subscribe side opens a dedicated pub/sub connection per
//! subscription. Use separate `RedisChannel` instances for the two sides so
//! each owns its own connection.

use crate::error::BusError;
use crate::events::{BrokerMessage, ChannelEvent};
use crate::publisher::ChannelPublisher;
use crate::subscriber::{ChannelSubscriber, Subscription};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

impl From<RedisError> for BusError {
    fn from(err: RedisError) -> Self {
        if err.is_io_error()
            || err.is_connection_refusal()
            || err.is_connection_dropped()
            || err.is_timeout()
        {
            Self::Unreachable(err.to_string())
        } else {
            Self::Rejected(err.to_string())
        }
    }
}

/// A Redis pub/sub client bound to one channel.
pub struct RedisChannel {
    /// Redis client (connection factory, performs no I/O by itself).
    client: Client,

    /// Channel name.
    channel: String,

    /// Upper bound on establishing a connection.
    connect_timeout: Duration,

    /// Cached publish connection.
    connection: Mutex<Option<MultiplexedConnection>>,

    /// Total messages accepted by the broker.
    events_published: AtomicU64,
}

impl RedisChannel {
    /// Create a client for `channel` on the broker at `url`.
    ///
    /// Only the URL is validated here; the broker is first contacted on
    /// publish or subscribe.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Rejected`] if the URL is malformed.
    pub fn open(
        url: &str,
        channel: impl Into<String>,
        connect_timeout: Duration,
    ) -> Result<Self, BusError> {
        let client = Client::open(url)
            .map_err(|e| BusError::Rejected(format!("invalid broker url {url}: {e}")))?;

        Ok(Self {
            client,
            channel: channel.into(),
            connect_timeout,
            connection: Mutex::new(None),
            events_published: AtomicU64::new(0),
        })
    }

    /// Name of the bound channel.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Bound a connection attempt or handshake by the configured timeout.
    async fn connect<T, F>(&self, attempt: F) -> Result<T, BusError>
    where
        F: Future<Output = Result<T, RedisError>>,
    {
        match tokio::time::timeout(self.connect_timeout, attempt).await {
            Ok(result) => result.map_err(BusError::from),
            Err(_) => Err(BusError::Unreachable(format!(
                "connection timed out after {:?}",
                self.connect_timeout
            ))),
        }
    }

    /// Get the cached publish connection, opening it on first use.
    async fn publish_connection(&self) -> Result<MultiplexedConnection, BusError> {
        let mut cached = self.connection.lock().await;
        if let Some(conn) = cached.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self
            .connect(self.client.get_multiplexed_async_connection())
            .await?;
        debug!(channel = %self.channel, "Opened publish connection");
        *cached = Some(conn.clone());
        Ok(conn)
    }
}

#[async_trait]
impl ChannelPublisher for RedisChannel {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn publish(&self, message: &str) -> Result<usize, BusError> {
        let mut conn = self.publish_connection().await?;

        let result: redis::RedisResult<usize> = conn.publish(&self.channel, message).await;
        match result {
            Ok(receivers) => {
                self.events_published.fetch_add(1, Ordering::Relaxed);
                debug!(channel = %self.channel, receivers, "Event published");
                Ok(receivers)
            }
            Err(e) => {
                let err = BusError::from(e);
                if err.is_unavailable() {
                    // Reconnect on the next publish.
                    self.connection.lock().await.take();
                }
                warn!(channel = %self.channel, error = %err, "Publish failed");
                Err(err)
            }
        }
    }

    fn events_published(&self) -> u64 {
        self.events_published.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ChannelSubscriber for RedisChannel {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn subscribe(&self) -> Result<Subscription, BusError> {
        let mut pubsub = self.connect(self.client.get_async_pubsub()).await?;
        // The SUBSCRIBE ack is bounded too.
        self.connect(pubsub.subscribe(&self.channel)).await?;

        info!(channel = %self.channel, "Redis subscription opened");

        let ack = BrokerMessage::Subscribed {
            channel: self.channel.clone(),
            active: 1,
        };

        let messages = pubsub.into_on_message().map(|msg| {
            BrokerMessage::Message(ChannelEvent {
                channel: msg.get_channel_name().to_string(),
                data: String::from_utf8_lossy(msg.get_payload_bytes()).into_owned(),
            })
        });

        Ok(Subscription::new(
            self.channel.clone(),
            stream::once(async move { ack }).chain(messages).boxed(),
        ))
    }
}
