//! Pub/Sub transport.
//!
//! Carries [`PubSubEvent`] envelopes between gateway processes over one shared
//! channel. [`RedisPubSub`] is the production transport; [`MemoryPubSub`] is a
//! hub that several in-process gateways can share (or that reports itself
//! unavailable) for tests and single-node development.

mod channels;
mod envelope;
mod memory;
mod publisher;
mod redis_transport;
mod subscriber;

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::pool::RedisPoolError;

pub use channels::{PubSubChannel, DEFAULT_EVENTS_CHANNEL};
pub use envelope::{EventTarget, PubSubEvent};
pub use memory::MemoryPubSub;
pub use publisher::Publisher;
pub use redis_transport::RedisPubSub;
pub use subscriber::{ReceivedMessage, Subscriber, SubscriberBuilder, SubscriberConfig};

/// Error type for pub/sub operations
#[derive(Debug, thiserror::Error)]
pub enum PubSubError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] RedisPoolError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Channel closed")]
    ChannelClosed,

    #[error("Pub/sub transport unavailable")]
    Unavailable,
}

/// Result type for pub/sub operations
pub type PubSubResult<T> = Result<T, PubSubError>;

/// A publish/subscribe backend shared by every gateway process
#[async_trait]
pub trait PubSubTransport: Send + Sync {
    /// Check that the backend is reachable
    async fn probe(&self) -> PubSubResult<()>;

    /// Publish an event; returns the number of receivers when known
    async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> PubSubResult<u32>;

    /// Start receiving messages published on `channel`
    async fn subscribe(
        &self,
        channel: &PubSubChannel,
    ) -> PubSubResult<broadcast::Receiver<ReceivedMessage>>;

    /// Stop background listeners
    async fn shutdown(&self);
}
