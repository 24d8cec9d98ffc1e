//! u7d-gateway - HTTP relay for UDP streams produced by a worker process
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod server;
pub mod streaming;
pub mod worker;
