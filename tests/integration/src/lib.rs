//! Integration test utilities for the chat gateway
//!
//! Starts the gateway on an ephemeral port with in-memory backends and drives
//! it over real WebSocket connections.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
