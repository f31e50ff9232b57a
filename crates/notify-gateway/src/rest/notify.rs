//! Publish endpoint: forwards caller messages to the channel.

use crate::domain::error::ApiResult;
use crate::domain::types::NotifyResponse;
use shared_bus::ChannelPublisher;
use std::sync::Arc;
use tracing::{info, warn};

/// Publish handler
pub struct NotifyRest {
    publisher: Arc<dyn ChannelPublisher>,
}

impl NotifyRest {
    pub fn new(publisher: Arc<dyn ChannelPublisher>) -> Self {
        Self { publisher }
    }

    /// Channel messages are published to
    pub fn channel(&self) -> &str {
        self.publisher.channel()
    }

    /// POST /notify - Forward `message` verbatim to the broker
    ///
    /// Succeeds as soon as the broker accepts the publish, whether or not
    /// anyone is subscribed. Broker failures are returned, never swallowed.
    pub async fn notify(&self, message: &str) -> ApiResult<NotifyResponse> {
        match self.publisher.publish(message).await {
            Ok(receivers) => {
                info!(
                    channel = self.channel(),
                    receivers,
                    bytes = message.len(),
                    "Message submitted to broker"
                );
                Ok(NotifyResponse::sent())
            }
            Err(e) => {
                warn!(channel = self.channel(), error = %e, "Publish failed");
                Err(e.into())
            }
        }
    }
}
