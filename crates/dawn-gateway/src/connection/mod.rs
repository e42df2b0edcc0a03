//! Connection management
//!
//! Tracks open WebSocket connections and their room subscriptions.

mod connection;
mod manager;

pub use connection::Connection;
pub use manager::ConnectionManager;
