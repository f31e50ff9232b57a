//! # Process Supervisor
//!
//! Launches the Subscriber Loop on its own task, at most once, and hands back
//! a handle for optional graceful shutdown.
//!
//! Dropping the [`SubscriberHandle`] abandons the task: it keeps consuming
//! until the process exits or the stream ends.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::handlers::{LoopExit, SubscriberLoop};

/// Supervisor errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SupervisorError {
    /// The Subscriber Loop was already launched by this supervisor.
    #[error("subscriber loop for {channel} already launched")]
    AlreadyLaunched {
        /// Channel the rejected loop would have consumed.
        channel: String,
    },
}

/// Owns the one-shot launch of the Subscriber Loop.
#[derive(Debug, Default)]
pub struct SubscriberSupervisor {
    launched: AtomicBool,
}

impl SubscriberSupervisor {
    /// Create a supervisor that has not launched anything yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `launch` has already succeeded.
    pub fn is_launched(&self) -> bool {
        self.launched.load(Ordering::Acquire)
    }

    /// Spawn `subscriber_loop` on its own task.
    ///
    /// Must be called from within a tokio runtime. A second call is rejected
    /// before any subscription is opened, and a finished loop is never
    /// restarted.
    pub fn launch(
        &self,
        subscriber_loop: SubscriberLoop,
    ) -> Result<SubscriberHandle, SupervisorError> {
        let channel = subscriber_loop.channel().to_string();

        if self
            .launched
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!(channel = %channel, "Subscriber Loop already launched, ignoring");
            return Err(SupervisorError::AlreadyLaunched { channel });
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(subscriber_loop.run(shutdown_rx));
        info!(channel = %channel, "Subscriber Loop launched");

        Ok(SubscriberHandle {
            channel,
            shutdown_tx,
            task,
        })
    }
}

/// Handle to a launched Subscriber Loop.
#[derive(Debug)]
pub struct SubscriberHandle {
    channel: String,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<LoopExit>,
}

impl SubscriberHandle {
    /// Channel the loop consumes.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Whether the loop task has stopped.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the loop to stop and wait up to `grace` for it.
    ///
    /// # Returns
    ///
    /// - `Some(exit)` - The loop stopped on its own terms
    /// - `None` - The loop overran `grace` and was aborted, or panicked
    pub async fn shutdown(mut self, grace: Duration) -> Option<LoopExit> {
        // Err means the loop already returned and dropped its receiver.
        let _ = self.shutdown_tx.send(true);

        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(Ok(exit)) => {
                info!(channel = %self.channel, ?exit, "Subscriber Loop stopped");
                Some(exit)
            }
            Ok(Err(e)) => {
                error!(channel = %self.channel, error = %e, "Subscriber Loop task failed");
                None
            }
            Err(_) => {
                warn!(
                    channel = %self.channel,
                    grace_ms = grace.as_millis() as u64,
                    "Subscriber Loop did not stop in time, aborting"
                );
                self.task.abort();
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::EventSink;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use shared_bus::{
        BusError, ChannelEvent, ChannelPublisher, ChannelSubscriber, InMemoryEventBus,
        Subscription, TASK_EVENTS_CHANNEL,
    };
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<String>>,
    }

    impl EventSink for RecordingSink {
        fn observe(&self, event: &ChannelEvent) {
            self.events.lock().push(event.data.clone());
        }
    }

    /// Subscriber that counts subscribe attempts.
    struct CountingSubscriber {
        inner: shared_bus::InMemoryChannel,
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl ChannelSubscriber for CountingSubscriber {
        fn channel(&self) -> &str {
            self.inner.channel()
        }

        async fn subscribe(&self) -> Result<Subscription, BusError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.inner.subscribe().await
        }
    }

    async fn wait_until<F: Fn() -> bool>(condition: F) {
        tokio::time::timeout(Duration::from_secs(2), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition reached");
    }

    #[tokio::test]
    async fn test_launch_once() {
        let bus = InMemoryEventBus::new();
        let subscriber = Arc::new(CountingSubscriber {
            inner: bus.channel(TASK_EVENTS_CHANNEL),
            attempts: AtomicUsize::new(0),
        });
        let sink = Arc::new(RecordingSink::default());
        let supervisor = SubscriberSupervisor::new();

        let handle = supervisor
            .launch(SubscriberLoop::new(subscriber.clone(), sink.clone()))
            .unwrap();
        assert!(supervisor.is_launched());
        assert_eq!(handle.channel(), TASK_EVENTS_CHANNEL);

        let second = supervisor.launch(SubscriberLoop::new(subscriber.clone(), sink));
        assert_eq!(
            second.unwrap_err(),
            SupervisorError::AlreadyLaunched {
                channel: TASK_EVENTS_CHANNEL.to_string()
            }
        );

        wait_until(|| bus.subscriber_count(TASK_EVENTS_CHANNEL) == 1).await;
        assert_eq!(subscriber.attempts.load(Ordering::SeqCst), 1);

        assert_eq!(
            handle.shutdown(Duration::from_secs(2)).await,
            Some(LoopExit::Cancelled { delivered: 0 })
        );
    }

    #[tokio::test]
    async fn test_finished_loop_is_not_restarted() {
        let bus = InMemoryEventBus::new();
        bus.set_online(false);
        let sink = Arc::new(RecordingSink::default());
        let supervisor = SubscriberSupervisor::new();

        let handle = supervisor
            .launch(SubscriberLoop::new(
                Arc::new(bus.channel(TASK_EVENTS_CHANNEL)),
                sink.clone(),
            ))
            .unwrap();
        wait_until(|| handle.is_finished()).await;

        bus.set_online(true);
        assert!(supervisor
            .launch(SubscriberLoop::new(
                Arc::new(bus.channel(TASK_EVENTS_CHANNEL)),
                sink,
            ))
            .is_err());
        assert_eq!(bus.subscriber_count(TASK_EVENTS_CHANNEL), 0);

        assert!(matches!(
            handle.shutdown(Duration::from_millis(100)).await,
            Some(LoopExit::SubscribeFailed(BusError::Unreachable(_)))
        ));
    }

    #[tokio::test]
    async fn test_dropped_handle_abandons_loop() {
        let bus = InMemoryEventBus::new();
        let publisher = bus.channel(TASK_EVENTS_CHANNEL);
        let sink = Arc::new(RecordingSink::default());
        let supervisor = SubscriberSupervisor::new();

        let handle = supervisor
            .launch(SubscriberLoop::new(
                Arc::new(bus.channel(TASK_EVENTS_CHANNEL)),
                sink.clone(),
            ))
            .unwrap();
        wait_until(|| bus.subscriber_count(TASK_EVENTS_CHANNEL) == 1).await;
        drop(handle);

        publisher.publish("after-drop").await.unwrap();
        wait_until(|| sink.events.lock().len() == 1).await;
        assert_eq!(*sink.events.lock(), vec!["after-drop"]);
    }

    /// Subscriber whose subscribe never completes.
    struct HangingSubscriber;

    #[async_trait]
    impl ChannelSubscriber for HangingSubscriber {
        fn channel(&self) -> &str {
            TASK_EVENTS_CHANNEL
        }

        async fn subscribe(&self) -> Result<Subscription, BusError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn test_shutdown_aborts_after_grace() {
        let supervisor = SubscriberSupervisor::new();
        let handle = supervisor
            .launch(SubscriberLoop::new(
                Arc::new(HangingSubscriber),
                Arc::new(RecordingSink::default()),
            ))
            .unwrap();

        assert_eq!(handle.shutdown(Duration::from_millis(50)).await, None);
    }
}
