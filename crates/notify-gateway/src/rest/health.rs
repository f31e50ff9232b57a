//! Liveness check.

use crate::domain::types::PingResponse;

/// Liveness handler. Holds no broker handle.
#[derive(Debug, Default)]
pub struct HealthRest;

impl HealthRest {
    pub fn new() -> Self {
        Self
    }

    /// GET /ping - Always `{"message":"pong"}`
    pub fn ping(&self) -> PingResponse {
        PingResponse::pong()
    }
}
