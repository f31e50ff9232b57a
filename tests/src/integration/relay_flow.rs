//! # Relay Flow Tests
//!
//! Drives a started [`NotifierRuntime`] over real HTTP and observes what its
//! Subscriber Loop hands to the sink.
//!
//! ## Flows Tested
//!
//! 1. **Publish → Deliver**: a posted message reaches the sink exactly once
//! 2. **Ordering**: messages arrive in publish order
//! 3. **Broker outage**: liveness still answers, publishes fail loudly
//! 4. **No subscriber**: publishing succeeds with nobody listening
//! 5. **Single launch**: the supervisor refuses a second Subscriber Loop

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;
    use reqwest::StatusCode;
    use serde_json::{json, Value};
    use tokio::time::timeout;

    use notifier_runtime::{
        EventSink, LoopExit, NotifierConfig, NotifierRuntime, SubscriberLoop, SupervisorError,
    };
    use shared_bus::{ChannelEvent, InMemoryEventBus, TASK_EVENTS_CHANNEL};

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    /// Sink remembering every observed payload
    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<ChannelEvent>>,
    }

    impl RecordingSink {
        fn payloads(&self) -> Vec<String> {
            self.events.lock().iter().map(|e| e.data.clone()).collect()
        }
    }

    impl EventSink for RecordingSink {
        fn observe(&self, event: &ChannelEvent) {
            self.events.lock().push(event.clone());
        }
    }

    struct Harness {
        bus: InMemoryEventBus,
        runtime: NotifierRuntime,
        sink: Arc<RecordingSink>,
        base: String,
        client: reqwest::Client,
    }

    impl Harness {
        async fn post_notify(&self, message: &str) -> (StatusCode, Value) {
            let response = self
                .client
                .post(format!("{}/notify", self.base))
                .query(&[("message", message)])
                .send()
                .await
                .unwrap();
            let status = response.status();
            (status, response.json().await.unwrap())
        }

        async fn get_ping(&self) -> (StatusCode, Value) {
            let response = self
                .client
                .get(format!("{}/ping", self.base))
                .send()
                .await
                .unwrap();
            let status = response.status();
            (status, response.json().await.unwrap())
        }

        async fn wait_for_events(&self, count: usize) {
            timeout(Duration::from_secs(2), async {
                while self.sink.events.lock().len() < count {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
            .await
            .expect("events delivered within bound");
        }

        async fn wait_subscribed(&self) {
            timeout(Duration::from_secs(2), async {
                while self.bus.subscriber_count(TASK_EVENTS_CHANNEL) == 0 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .expect("Subscriber Loop subscribed");
        }
    }

    /// Start a runtime on an ephemeral port over an in-memory broker
    async fn start_harness(bus: InMemoryEventBus) -> Harness {
        let mut config = NotifierConfig::default();
        config.gateway.http.host = [127, 0, 0, 1].into();
        config.gateway.http.port = 0;
        config.subscriber.shutdown_grace = Duration::from_millis(500);

        let sink = Arc::new(RecordingSink::default());
        let runtime = NotifierRuntime::new(
            config,
            Arc::new(bus.channel(TASK_EVENTS_CHANNEL)),
            Arc::new(bus.channel(TASK_EVENTS_CHANNEL)),
            sink.clone(),
        );
        let addr = runtime.start().await.unwrap();

        Harness {
            bus,
            runtime,
            sink,
            base: format!("http://{addr}"),
            client: reqwest::Client::new(),
        }
    }

    // =============================================================================
    // FLOWS
    // =============================================================================

    #[tokio::test]
    async fn test_posted_message_is_delivered_once() {
        let harness = start_harness(InMemoryEventBus::new()).await;
        harness.wait_subscribed().await;

        let (status, body) = harness.post_notify("deploy-v1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "sent"}));

        harness.wait_for_events(1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        let events = harness.sink.events.lock().clone();
        assert_eq!(events, vec![ChannelEvent::new(TASK_EVENTS_CHANNEL, "deploy-v1")]);

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_messages_arrive_in_publish_order() {
        let harness = start_harness(InMemoryEventBus::new()).await;
        harness.wait_subscribed().await;

        for message in ["a", "b", "task 3 done"] {
            let (status, _) = harness.post_notify(message).await;
            assert_eq!(status, StatusCode::OK);
        }

        harness.wait_for_events(3).await;
        assert_eq!(harness.sink.payloads(), vec!["a", "b", "task 3 done"]);

        assert_eq!(
            harness.runtime.shutdown().await,
            Some(LoopExit::Cancelled { delivered: 3 })
        );
    }

    #[tokio::test]
    async fn test_ping_with_broker_down() {
        let harness = start_harness(InMemoryEventBus::new()).await;
        harness.bus.set_online(false);

        let (status, body) = harness.get_ping().await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "pong"}));

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_publish_with_broker_down_fails() {
        let harness = start_harness(InMemoryEventBus::new()).await;
        harness.wait_subscribed().await;
        harness.bus.set_online(false);

        let (status, body) = harness.post_notify("lost").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.get("status").is_none());
        assert!(body["error"].as_str().is_some());
        assert!(harness.sink.payloads().is_empty());

        // Loop ended with the connection and is not revived.
        timeout(Duration::from_secs(2), async {
            while harness.runtime.is_subscriber_running() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Subscriber Loop exits");
        assert_eq!(
            harness.runtime.shutdown().await,
            Some(LoopExit::StreamEnded { delivered: 0 })
        );
    }

    #[tokio::test]
    async fn test_publish_without_subscriber_succeeds() {
        let bus = InMemoryEventBus::new();
        bus.set_online(false);
        let harness = start_harness(bus).await;

        timeout(Duration::from_secs(2), async {
            while harness.runtime.is_subscriber_running() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("Subscriber Loop gives up");

        harness.bus.set_online(true);
        let (status, body) = harness.post_notify("nobody-listening").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "sent"}));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(harness.sink.payloads().is_empty());
        assert_eq!(harness.bus.subscriber_count(TASK_EVENTS_CHANNEL), 0);

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_missing_message_rejected() {
        let harness = start_harness(InMemoryEventBus::new()).await;

        let response = harness
            .client
            .post(format!("{}/notify", harness.base))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        harness.runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_second_launch_rejected() {
        let harness = start_harness(InMemoryEventBus::new()).await;
        harness.wait_subscribed().await;

        let second = harness.runtime.supervisor().launch(SubscriberLoop::new(
            Arc::new(harness.bus.channel(TASK_EVENTS_CHANNEL)),
            harness.sink.clone(),
        ));
        assert!(matches!(
            second,
            Err(SupervisorError::AlreadyLaunched { .. })
        ));
        assert_eq!(harness.bus.subscriber_count(TASK_EVENTS_CHANNEL), 1);

        harness.post_notify("once").await;
        harness.wait_for_events(1).await;
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(harness.sink.payloads(), vec!["once"]);

        harness.runtime.shutdown().await;
    }
}
