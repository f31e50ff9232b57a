//! # Notifier Runtime Library
//!
//! Wires the HTTP gateway and the background Subscriber Loop to one broker
//! channel. The main entry point is the `notifier` binary.
//!
//! ## Startup Sequence
//!
//! 1. Validate configuration
//! 2. Bind the HTTP listener (the process is now ready)
//! 3. Launch the Subscriber Loop through the supervisor
//! 4. Serve HTTP
//!
//! The Subscriber Loop runs on its own task and never blocks readiness. If it
//! stops, HTTP keeps serving.

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod container;
pub mod handlers;
pub mod logging;
pub mod supervisor;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use notify_gateway::{GatewayError, NotifyGatewayService};
use parking_lot::Mutex;
use shared_bus::{BusError, ChannelPublisher, ChannelSubscriber, RedisChannel, TASK_EVENTS_CHANNEL};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub use container::{ConfigError, NotifierConfig};
pub use handlers::{EventSink, LogSink, LoopExit, SubscriberLoop};
pub use supervisor::{SubscriberHandle, SubscriberSupervisor, SupervisorError};

/// Tasks owned by a started runtime.
struct Running {
    addr: SocketAddr,
    http_shutdown: oneshot::Sender<()>,
    http_task: JoinHandle<Result<(), GatewayError>>,
    subscriber: SubscriberHandle,
}

/// Where the runtime is in its single start/stop cycle.
enum Lifecycle {
    Idle,
    /// Claimed by a `start` call that has not finished binding.
    Starting,
    Running(Running),
    Stopped,
}

/// The notifier process: HTTP gateway plus Subscriber Loop.
pub struct NotifierRuntime {
    config: NotifierConfig,
    publisher: Arc<dyn ChannelPublisher>,
    subscriber: Arc<dyn ChannelSubscriber>,
    sink: Arc<dyn EventSink>,
    supervisor: SubscriberSupervisor,
    state: Mutex<Lifecycle>,
}

impl NotifierRuntime {
    /// Create a runtime over explicit channel clients.
    ///
    /// `publisher` and `subscriber` should hold separate connections.
    pub fn new(
        config: NotifierConfig,
        publisher: Arc<dyn ChannelPublisher>,
        subscriber: Arc<dyn ChannelSubscriber>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            config,
            publisher,
            subscriber,
            sink,
            supervisor: SubscriberSupervisor::new(),
            state: Mutex::new(Lifecycle::Idle),
        }
    }

    /// Create a runtime backed by the Redis broker in `config`.
    ///
    /// No connection is opened until the first publish or subscribe.
    pub fn with_redis(config: NotifierConfig) -> Result<Self, BusError> {
        let url = config.broker.broker_url();
        let timeout = config.broker.connect_timeout;

        let publisher = RedisChannel::open(&url, TASK_EVENTS_CHANNEL, timeout)?;
        let subscriber = RedisChannel::open(&url, TASK_EVENTS_CHANNEL, timeout)?;
        info!(broker = %url, channel = TASK_EVENTS_CHANNEL, "Broker channels configured");

        Ok(Self::new(
            config,
            Arc::new(publisher),
            Arc::new(subscriber),
            Arc::new(LogSink),
        ))
    }

    /// Get the configuration.
    pub fn config(&self) -> &NotifierConfig {
        &self.config
    }

    /// Supervisor owning the Subscriber Loop launch.
    pub fn supervisor(&self) -> &SubscriberSupervisor {
        &self.supervisor
    }

    /// Bound HTTP address, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock() {
            Lifecycle::Running(running) => Some(running.addr),
            _ => None,
        }
    }

    /// Whether the Subscriber Loop task is still alive.
    pub fn is_subscriber_running(&self) -> bool {
        match &*self.state.lock() {
            Lifecycle::Running(running) => !running.subscriber.is_finished(),
            _ => false,
        }
    }

    /// Start the runtime and return the bound HTTP address.
    ///
    /// Only one call ever succeeds; concurrent or repeated calls fail without
    /// binding.
    pub async fn start(&self) -> Result<SocketAddr> {
        {
            let mut state = self.state.lock();
            match &*state {
                Lifecycle::Idle => {}
                Lifecycle::Stopped => bail!("notifier runtime already stopped"),
                Lifecycle::Starting | Lifecycle::Running(_) => {
                    bail!("notifier runtime already started")
                }
            }
            *state = Lifecycle::Starting;
        }

        match self.launch().await {
            Ok(running) => {
                let addr = running.addr;
                *self.state.lock() = Lifecycle::Running(running);
                info!(%addr, channel = self.publisher.channel(), "Notifier ready");
                Ok(addr)
            }
            Err(e) => {
                // Not started; release the claim.
                *self.state.lock() = Lifecycle::Idle;
                Err(e)
            }
        }
    }

    async fn launch(&self) -> Result<Running> {
        self.config
            .validate()
            .context("invalid notifier configuration")?;

        let service =
            NotifyGatewayService::new(self.config.gateway.clone(), Arc::clone(&self.publisher))
                .context("failed to build HTTP gateway")?;
        let listener = service
            .bind()
            .await
            .context("failed to bind HTTP listener")?;
        let addr = listener
            .local_addr()
            .context("failed to read bound HTTP address")?;

        // Ready: the loop starts only now and runs beside HTTP.
        let subscriber = self
            .supervisor
            .launch(SubscriberLoop::new(
                Arc::clone(&self.subscriber),
                Arc::clone(&self.sink),
            ))
            .context("failed to launch Subscriber Loop")?;

        let (http_shutdown, http_rx) = oneshot::channel();
        let http_task = tokio::spawn(service.serve(listener, async move {
            let _ = http_rx.await;
        }));

        Ok(Running {
            addr,
            http_shutdown,
            http_task,
            subscriber,
        })
    }

    /// Stop HTTP gracefully and give the Subscriber Loop its grace period.
    ///
    /// Returns how the loop ended, or `None` if it had to be aborted or the
    /// runtime was never started.
    pub async fn shutdown(&self) -> Option<LoopExit> {
        let running = {
            let mut state = self.state.lock();
            match std::mem::replace(&mut *state, Lifecycle::Stopped) {
                Lifecycle::Running(running) => running,
                other => {
                    *state = other;
                    return None;
                }
            }
        };
        let grace = self.config.subscriber.shutdown_grace;
        info!("Initiating graceful shutdown...");

        let _ = running.http_shutdown.send(());
        let mut http_task = running.http_task;
        match tokio::time::timeout(grace, &mut http_task).await {
            Ok(Ok(Ok(()))) => {}
            Ok(Ok(Err(e))) => error!(error = %e, "HTTP server failed"),
            Ok(Err(e)) => error!(error = %e, "HTTP server task failed"),
            Err(_) => {
                warn!("HTTP server did not drain in time, aborting");
                http_task.abort();
            }
        }

        let exit = running.subscriber.shutdown(grace).await;
        info!("Shutdown complete");
        exit
    }
}
