//! # Bus Errors
//!
//! Failures the broker collaborator can report to either side of the channel.

use thiserror::Error;

/// Errors from publish and subscribe operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The broker could not be reached (connect failure, IO error, timeout).
    #[error("Broker unreachable: {0}")]
    Unreachable(String),

    /// The broker answered, but refused the command.
    #[error("Broker rejected request: {0}")]
    Rejected(String),

    /// The bus was shut down.
    #[error("Event bus closed")]
    Closed,
}

impl BusError {
    /// Whether the failure is about connectivity rather than the request itself.
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unreachable(_) | Self::Closed)
    }
}
