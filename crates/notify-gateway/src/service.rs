//! Notify gateway service - main entry point of the HTTP surface.
//!
//! Binding and serving are separate steps: a bound listener is the moment the
//! process becomes ready to accept traffic, and callers hook their own
//! startup work in between.

use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::rest::RestHandlers;
use crate::router::{build_router, AppState};
use axum::Router;
use shared_bus::ChannelPublisher;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Notify gateway service state
pub struct NotifyGatewayService {
    config: GatewayConfig,
    rest: Arc<RestHandlers>,
}

impl NotifyGatewayService {
    /// Create a new gateway service
    pub fn new(
        config: GatewayConfig,
        publisher: Arc<dyn ChannelPublisher>,
    ) -> Result<Self, GatewayError> {
        config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        Ok(Self {
            config,
            rest: Arc::new(RestHandlers::new(publisher)),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Build the HTTP router
    pub fn router(&self) -> Router {
        let state = AppState {
            rest: Arc::clone(&self.rest),
        };
        build_router(state, &self.config)
    }

    /// Bind the HTTP listener
    pub async fn bind(&self) -> Result<TcpListener, GatewayError> {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| GatewayError::Bind { addr, source })?;

        info!(
            addr = %listener.local_addr().unwrap_or(addr),
            channel = self.rest.notify.channel(),
            "HTTP listener bound"
        );
        Ok(listener)
    }

    /// Serve HTTP on `listener` until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), GatewayError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let router = self.router();

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("HTTP server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::{InMemoryEventBus, TASK_EVENTS_CHANNEL};
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn local_config() -> GatewayConfig {
        let mut config = GatewayConfig::default();
        config.http.host = IpAddr::V4(Ipv4Addr::LOCALHOST);
        config.http.port = 0;
        config
    }

    #[test]
    fn test_invalid_config_rejected() {
        let bus = InMemoryEventBus::new();
        let mut config = local_config();
        config.timeouts.request = Duration::ZERO;

        let result = NotifyGatewayService::new(config, Arc::new(bus.channel(TASK_EVENTS_CHANNEL)));
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }

    #[tokio::test]
    async fn test_bind_and_shutdown() {
        let bus = InMemoryEventBus::new();
        let service =
            NotifyGatewayService::new(local_config(), Arc::new(bus.channel(TASK_EVENTS_CHANNEL)))
                .unwrap();

        let listener = service.bind().await.unwrap();
        assert_ne!(listener.local_addr().unwrap().port(), 0);

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(service.serve(listener, async move {
            let _ = rx.await;
        }));

        tx.send(()).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(2), server)
            .await
            .expect("server stops")
            .expect("task joins");
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict() {
        let bus = InMemoryEventBus::new();
        let first =
            NotifyGatewayService::new(local_config(), Arc::new(bus.channel(TASK_EVENTS_CHANNEL)))
                .unwrap();
        let held = first.bind().await.unwrap();

        let mut config = local_config();
        config.http.port = held.local_addr().unwrap().port();
        let second =
            NotifyGatewayService::new(config, Arc::new(bus.channel(TASK_EVENTS_CHANNEL))).unwrap();

        assert!(matches!(
            second.bind().await,
            Err(GatewayError::Bind { .. })
        ));
    }
}
