//! # dawn-gateway
//!
//! WebSocket gateway for Dusk and Dawn chat: authenticated connections, room
//! subscriptions, message fan-out, typing indicators and presence, bridged
//! across processes over pub/sub.

pub mod bridge;
pub mod connection;
pub mod handlers;
pub mod protocol;
pub mod server;
pub mod workers;

#[cfg(test)]
mod testing;

pub use server::{create_app, create_router, run, Backends, GatewayState};
