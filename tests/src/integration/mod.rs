//! # Integration Tests
//!
//! Full relay flows: HTTP client → gateway → broker → Subscriber Loop → sink.

pub mod relay_flow;
