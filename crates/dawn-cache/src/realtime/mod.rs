//! Realtime state cache.
//!
//! Typing indicators and online presence with TTL expiry, plus a buffer of
//! last-seen timestamps drained periodically into chat profiles. Two backends
//! implement [`RealtimeStateCache`]: Redis for multi-process deployments and a
//! process-local map for development and tests.

mod memory;
mod redis_store;

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dawn_core::{ParticipantId, RoomId};
use serde::{Deserialize, Serialize};

use crate::pool::RedisPoolError;

pub use memory::MemoryStateCache;
pub use redis_store::RedisStateCache;

/// Error type for realtime cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Redis pool error: {0}")]
    Pool(#[from] RedisPoolError),

    #[error("Redis command error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<deadpool_redis::PoolError> for CacheError {
    fn from(e: deadpool_redis::PoolError) -> Self {
        Self::Pool(RedisPoolError::GetConnection(e))
    }
}

/// Result type for realtime cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// One participant currently composing a message in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingEntry {
    pub participant_id: ParticipantId,
    pub display_name: String,
}

/// Online state of a participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceEntry {
    pub participant_id: ParticipantId,
    pub online: bool,
    pub last_heartbeat: DateTime<Utc>,
    /// Gateway connections that reported this participant online
    pub connections: BTreeSet<String>,
}

impl PresenceEntry {
    fn new(participant_id: ParticipantId) -> Self {
        Self {
            participant_id,
            online: true,
            last_heartbeat: Utc::now(),
            connections: BTreeSet::new(),
        }
    }

    fn touch(&mut self) {
        self.online = true;
        self.last_heartbeat = Utc::now();
    }
}

/// Typing and presence state shared by the gateway's connections
#[async_trait]
pub trait RealtimeStateCache: Send + Sync {
    /// Upsert a typing indicator; it expires after the typing TTL
    async fn set_typing(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: &str,
    ) -> CacheResult<()>;

    /// All non-expired typers in a room, unordered
    async fn get_typers(&self, room_id: RoomId) -> CacheResult<Vec<TypingEntry>>;

    /// Remove a typing indicator immediately
    async fn clear_typing(&self, room_id: RoomId, participant_id: ParticipantId) -> CacheResult<()>;

    /// Remove expired typing indicators; returns how many were removed
    async fn cleanup_stale_typing(&self) -> CacheResult<usize>;

    /// Refresh presence and record the connection
    async fn set_online(&self, connection_id: &str, participant_id: ParticipantId) -> CacheResult<()>;

    /// Forget a closed connection; the presence entry itself still expires by TTL
    async fn remove_connection(&self, connection_id: &str, participant_id: ParticipantId) -> CacheResult<()>;

    /// Refresh presence expiry and buffer a last-seen timestamp
    async fn heartbeat(&self, participant_id: ParticipantId) -> CacheResult<()>;

    /// Presence entry if it has not expired
    async fn get_presence(&self, participant_id: ParticipantId) -> CacheResult<Option<PresenceEntry>>;

    /// Drain buffered last-seen timestamps
    async fn take_last_seen(&self) -> CacheResult<Vec<(ParticipantId, DateTime<Utc>)>>;
}
