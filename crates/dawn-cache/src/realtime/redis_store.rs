//! Redis-backed realtime state cache.
//!
//! Key layout:
//! - `typing:{room_id}:{participant_id}` JSON [`TypingRecord`], `PSETEX` typing TTL
//! - `presence:{participant_id}` last heartbeat in epoch millis, `SETEX` presence TTL
//! - `presence:{participant_id}:connections` set of connection ids, same TTL
//! - `presence:last_seen` hash of participant id to epoch millis, drained by the flush worker

use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dawn_core::{ParticipantId, RoomId};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use super::{CacheResult, PresenceEntry, RealtimeStateCache, TypingEntry};
use crate::pool::RedisPool;

/// Key prefix for typing indicators
const TYPING_PREFIX: &str = "typing:";
/// Key prefix for presence entries
const PRESENCE_PREFIX: &str = "presence:";
/// Hash of buffered last-seen timestamps
const LAST_SEEN_KEY: &str = "presence:last_seen";
/// SCAN batch hint
const SCAN_COUNT: usize = 100;

/// Stored typing value; the expiry is kept alongside Redis' own TTL so the
/// sweep can tell stale entries apart from live ones
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TypingRecord {
    #[serde(flatten)]
    entry: TypingEntry,
    expires_at_ms: i64,
}

/// Realtime state cache on a shared Redis pool
#[derive(Clone)]
pub struct RedisStateCache {
    pool: RedisPool,
    typing_ttl: Duration,
    presence_ttl: Duration,
}

impl RedisStateCache {
    #[must_use]
    pub fn new(pool: RedisPool, typing_ttl: Duration, presence_ttl: Duration) -> Self {
        Self {
            pool,
            typing_ttl,
            presence_ttl,
        }
    }

    fn typing_key(room_id: RoomId, participant_id: ParticipantId) -> String {
        format!("{TYPING_PREFIX}{room_id}:{participant_id}")
    }

    fn presence_key(participant_id: ParticipantId) -> String {
        format!("{PRESENCE_PREFIX}{participant_id}")
    }

    fn connections_key(participant_id: ParticipantId) -> String {
        format!("{PRESENCE_PREFIX}{participant_id}:connections")
    }

    async fn load_typing(&self, keys: &[String]) -> CacheResult<Vec<(String, Option<TypingRecord>)>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.pool.get().await?;
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;

        Ok(keys
            .iter()
            .cloned()
            .zip(values)
            .map(|(key, raw)| (key, raw.and_then(|raw| serde_json::from_str(&raw).ok())))
            .collect())
    }

    // Every write is a blind SET or SADD so concurrent refreshes from other
    // processes never drop each other's connection ids
    async fn refresh_presence(
        &self,
        participant_id: ParticipantId,
        connection_id: Option<&str>,
    ) -> CacheResult<()> {
        let ttl_secs = self.presence_ttl.as_secs().max(1);
        let connections_key = Self::connections_key(participant_id);
        let now = Utc::now().timestamp_millis();

        let mut pipe = redis::pipe();
        pipe.atomic()
            .set_ex(Self::presence_key(participant_id), now, ttl_secs)
            .ignore();
        if let Some(connection_id) = connection_id {
            pipe.sadd(&connections_key, connection_id).ignore();
        }
        pipe.expire(&connections_key, i64::try_from(ttl_secs).unwrap_or(i64::MAX))
            .ignore()
            .hset(LAST_SEEN_KEY, participant_id.into_inner(), now)
            .ignore();

        let mut conn = self.pool.get().await?;
        pipe.query_async::<()>(&mut conn).await?;

        tracing::trace!(participant_id = %participant_id, "Refreshed presence");
        Ok(())
    }
}

#[async_trait]
impl RealtimeStateCache for RedisStateCache {
    async fn set_typing(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: &str,
    ) -> CacheResult<()> {
        let ttl_ms = u64::try_from(self.typing_ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let record = TypingRecord {
            entry: TypingEntry {
                participant_id,
                display_name: display_name.to_string(),
            },
            expires_at_ms: Utc::now().timestamp_millis() + i64::try_from(ttl_ms).unwrap_or(i64::MAX),
        };

        let mut conn = self.pool.get().await?;
        conn.pset_ex::<_, _, ()>(
            Self::typing_key(room_id, participant_id),
            serde_json::to_string(&record)?,
            ttl_ms,
        )
        .await?;

        tracing::trace!(room_id = %room_id, participant_id = %participant_id, "Set typing indicator");
        Ok(())
    }

    async fn get_typers(&self, room_id: RoomId) -> CacheResult<Vec<TypingEntry>> {
        let keys = self
            .pool
            .scan_keys(&format!("{TYPING_PREFIX}{room_id}:*"), SCAN_COUNT)
            .await?;
        let now = Utc::now().timestamp_millis();

        Ok(self
            .load_typing(&keys)
            .await?
            .into_iter()
            .filter_map(|(_, record)| record)
            .filter(|record| record.expires_at_ms > now)
            .map(|record| record.entry)
            .collect())
    }

    async fn clear_typing(&self, room_id: RoomId, participant_id: ParticipantId) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        conn.del::<_, ()>(Self::typing_key(room_id, participant_id)).await?;
        Ok(())
    }

    async fn cleanup_stale_typing(&self) -> CacheResult<usize> {
        let keys = self
            .pool
            .scan_keys(&format!("{TYPING_PREFIX}*"), SCAN_COUNT)
            .await?;
        let now = Utc::now().timestamp_millis();

        // Unreadable values count as stale
        let stale: Vec<String> = self
            .load_typing(&keys)
            .await?
            .into_iter()
            .filter(|(_, record)| record.as_ref().map_or(true, |r| r.expires_at_ms <= now))
            .map(|(key, _)| key)
            .collect();

        if stale.is_empty() {
            return Ok(0);
        }

        let mut conn = self.pool.get().await?;
        let removed: usize = conn.del(&stale).await?;
        Ok(removed)
    }

    async fn set_online(&self, connection_id: &str, participant_id: ParticipantId) -> CacheResult<()> {
        self.refresh_presence(participant_id, Some(connection_id)).await
    }

    async fn remove_connection(&self, connection_id: &str, participant_id: ParticipantId) -> CacheResult<()> {
        let mut conn = self.pool.get().await?;
        conn.srem::<_, _, ()>(Self::connections_key(participant_id), connection_id)
            .await?;
        Ok(())
    }

    async fn heartbeat(&self, participant_id: ParticipantId) -> CacheResult<()> {
        self.refresh_presence(participant_id, None).await
    }

    async fn get_presence(&self, participant_id: ParticipantId) -> CacheResult<Option<PresenceEntry>> {
        let mut conn = self.pool.get().await?;
        let (heartbeat_ms, connections): (Option<i64>, BTreeSet<String>) = redis::pipe()
            .get(Self::presence_key(participant_id))
            .smembers(Self::connections_key(participant_id))
            .query_async(&mut conn)
            .await?;

        Ok(heartbeat_ms
            .and_then(DateTime::from_timestamp_millis)
            .map(|last_heartbeat| PresenceEntry {
                participant_id,
                online: true,
                last_heartbeat,
                connections,
            }))
    }

    async fn take_last_seen(&self) -> CacheResult<Vec<(ParticipantId, DateTime<Utc>)>> {
        let mut conn = self.pool.get().await?;
        let (buffered,): (HashMap<i64, i64>,) = redis::pipe()
            .atomic()
            .hgetall(LAST_SEEN_KEY)
            .del(LAST_SEEN_KEY)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(buffered
            .into_iter()
            .filter_map(|(participant, millis)| {
                DateTime::from_timestamp_millis(millis).map(|at| (ParticipantId::new(participant), at))
            })
            .collect())
    }
}
