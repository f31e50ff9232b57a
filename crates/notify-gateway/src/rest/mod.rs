//! REST handlers behind the HTTP routes.

pub mod health;
pub mod notify;

pub use health::HealthRest;
pub use notify::NotifyRest;

use shared_bus::ChannelPublisher;
use std::sync::Arc;

/// All REST handlers
pub struct RestHandlers {
    pub health: HealthRest,
    pub notify: NotifyRest,
}

impl RestHandlers {
    /// Create all REST handlers around the channel publisher
    pub fn new(publisher: Arc<dyn ChannelPublisher>) -> Self {
        Self {
            health: HealthRest::new(),
            notify: NotifyRest::new(publisher),
        }
    }
}
