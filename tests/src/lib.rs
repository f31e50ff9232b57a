//! # Task Notifier Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # End-to-end relay flows over a real socket
//!     └── relay_flow.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p notifier-tests
//!
//! # By category
//! cargo test -p notifier-tests integration::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
