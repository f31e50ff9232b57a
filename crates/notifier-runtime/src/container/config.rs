//! # Notifier Configuration
//!
//! Unified configuration for the broker connection, the HTTP gateway and
//! logging.
//!
//! ## Environment Overrides
//!
//! | Variable | Default |
//! |----------|---------|
//! | `NOTIFIER_REDIS_HOST` | `redis` |
//! | `NOTIFIER_REDIS_PORT` | `6379` |
//! | `NOTIFIER_REDIS_CONNECT_TIMEOUT_MS` | `5000` |
//! | `NOTIFIER_HTTP_HOST` | `0.0.0.0` |
//! | `NOTIFIER_HTTP_PORT` | `8000` |
//! | `NOTIFIER_LOG_LEVEL` | `info` (used when `RUST_LOG` is unset) |
//! | `NOTIFIER_JSON_LOGS` | `false` |

use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

use notify_gateway::GatewayConfig;
use tracing::warn;

/// Complete notifier configuration.
#[derive(Debug, Clone, Default)]
pub struct NotifierConfig {
    /// Broker connection.
    pub broker: BrokerConfig,
    /// HTTP gateway.
    pub gateway: GatewayConfig,
    /// Logging.
    pub log: LogConfig,
    /// Subscriber Loop lifecycle.
    pub subscriber: SubscriberConfig,
}

impl NotifierConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Unparseable values are logged and the default is kept.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(host) = lookup("NOTIFIER_REDIS_HOST") {
            config.broker.host = host;
        }
        override_parsed(&lookup, "NOTIFIER_REDIS_PORT", &mut config.broker.port);
        let mut timeout_ms = config.broker.connect_timeout.as_millis() as u64;
        override_parsed(&lookup, "NOTIFIER_REDIS_CONNECT_TIMEOUT_MS", &mut timeout_ms);
        config.broker.connect_timeout = Duration::from_millis(timeout_ms);

        override_parsed(&lookup, "NOTIFIER_HTTP_HOST", &mut config.gateway.http.host);
        override_parsed(&lookup, "NOTIFIER_HTTP_PORT", &mut config.gateway.http.port);

        config.log = LogConfig::from_lookup(&lookup);

        config
    }

    /// Validate configuration before starting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.gateway.validate()?;

        if self.broker.host.trim().is_empty() {
            return Err(ConfigError::InvalidBroker("host is empty".into()));
        }
        if self.broker.connect_timeout.is_zero() {
            return Err(ConfigError::InvalidBroker(
                "connect timeout must be > 0".into(),
            ));
        }
        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &str, target: &mut T)
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        return;
    };
    match raw.trim().parse() {
        Ok(value) => *target = value,
        Err(e) => warn!(key, value = %raw, error = %e, "Ignoring invalid environment override"),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Broker settings are unusable.
    #[error("invalid broker config: {0}")]
    InvalidBroker(String),
    /// Gateway settings are unusable.
    #[error("invalid gateway config: {0}")]
    Gateway(#[from] notify_gateway::domain::ConfigError),
}

/// Broker connection configuration.
#[derive(Debug, Clone)]
pub struct BrokerConfig {
    /// Broker hostname.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// Upper bound on establishing a connection.
    pub connect_timeout: Duration,
}

impl BrokerConfig {
    /// Connection URL for the broker.
    pub fn broker_url(&self) -> String {
        format!("redis://{}:{}/", self.host, self.port)
    }
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: "redis".to_string(),
            port: 6379,
            connect_timeout: Duration::from_millis(5000),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl LogConfig {
    /// Load only the logging settings from the process environment.
    ///
    /// Needed before the subscriber exists, so an invalid value here is
    /// reported later by [`NotifierConfig::from_env`].
    pub fn from_env() -> Self {
        Self::from_lookup(&|key: &str| std::env::var(key).ok())
    }

    /// Load only the logging settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut log = Self::default();
        if let Some(level) = lookup("NOTIFIER_LOG_LEVEL") {
            log.level = level;
        }
        override_parsed(lookup, "NOTIFIER_JSON_LOGS", &mut log.json);
        log
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Subscriber Loop lifecycle configuration.
#[derive(Debug, Clone)]
pub struct SubscriberConfig {
    /// How long shutdown waits for the loop before aborting it.
    pub shutdown_grace: Duration,
}

impl Default for SubscriberConfig {
    fn default() -> Self {
        Self {
            shutdown_grace: Duration::from_secs(2),
        }
    }
}
