//! # dawn-cache
//!
//! Realtime state and cross-process fan-out for the chat gateway.
//!
//! ## Features
//!
//! - **Connection Pool**: managed Redis connection pool with deadpool
//! - **Realtime State**: typing indicators, presence, and buffered last-seen
//!   timestamps behind [`RealtimeStateCache`] (Redis or in-memory)
//! - **Pub/Sub**: event envelopes over [`PubSubTransport`] (Redis or an
//!   in-process hub)
//!
//! ## Example
//!
//! ```ignore
//! use dawn_cache::{RedisPool, RedisPoolConfig, RedisPubSub, RedisStateCache};
//!
//! let pool = RedisPool::new(RedisPoolConfig::default())?;
//! let cache = RedisStateCache::new(pool.clone(), typing_ttl, presence_ttl);
//! let transport = RedisPubSub::new(pool);
//!
//! cache.set_typing(room_id, participant_id, "Ash").await?;
//! transport.publish(&PubSubChannel::default(), &event).await?;
//! ```

pub mod pool;
pub mod pubsub;
pub mod realtime;

// Re-export pool types
pub use pool::{RedisPool, RedisPoolConfig, RedisPoolError, RedisResult};

// Re-export realtime types
pub use realtime::{
    CacheError, CacheResult, MemoryStateCache, PresenceEntry, RealtimeStateCache,
    RedisStateCache, TypingEntry,
};

// Re-export pubsub types
pub use pubsub::{
    EventTarget, MemoryPubSub, PubSubChannel, PubSubError, PubSubEvent, PubSubResult,
    PubSubTransport, Publisher, ReceivedMessage, RedisPubSub, Subscriber, SubscriberBuilder,
    SubscriberConfig, DEFAULT_EVENTS_CHANNEL,
};
