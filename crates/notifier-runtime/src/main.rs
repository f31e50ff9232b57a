//! # Notifier
//!
//! Task notification bridge: accepts messages over HTTP, publishes them to the
//! `task-events` broker channel and logs everything it hears back on that
//! channel.
//!
//! ## Endpoints
//!
//! - `GET /ping` - liveness, never touches the broker
//! - `POST /notify?message=<text>` - publish `<text>` to the channel

use anyhow::{Context, Result};
use tracing::info;

use notifier_runtime::container::LogConfig;
use notifier_runtime::logging::init_logging;
use notifier_runtime::{NotifierConfig, NotifierRuntime};

#[tokio::main]
async fn main() -> Result<()> {
    // Logging precedes config loading, which may warn
    init_logging(&LogConfig::from_env()).context("failed to initialize logging")?;

    // Load configuration
    let config = NotifierConfig::from_env();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        broker = %config.broker.broker_url(),
        "Starting notifier"
    );

    let runtime = NotifierRuntime::with_redis(config).context("failed to configure broker")?;
    runtime.start().await?;

    // Keep running
    info!("Notifier is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    // Graceful shutdown
    runtime.shutdown().await;

    Ok(())
}
