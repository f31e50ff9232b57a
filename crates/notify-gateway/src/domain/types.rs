//! Request and response bodies of the HTTP surface.

use serde::{Deserialize, Serialize};

/// Reply of the liveness endpoint
pub const PONG: &str = "pong";

/// Status reported once the broker accepted a publish
pub const STATUS_SENT: &str = "sent";

/// Input of `POST /notify`, read from the query string.
///
/// The message is forwarded verbatim; no size or content validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NotifyParams {
    pub message: String,
}

/// Submission acknowledgment: the broker accepted the publish.
///
/// Says nothing about delivery to any subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyResponse {
    pub status: String,
}

impl NotifyResponse {
    pub fn sent() -> Self {
        Self {
            status: STATUS_SENT.to_string(),
        }
    }
}

/// Liveness reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub message: String,
}

impl PingResponse {
    pub fn pong() -> Self {
        Self {
            message: PONG.to_string(),
        }
    }
}
