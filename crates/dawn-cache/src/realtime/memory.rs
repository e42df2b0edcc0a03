//! Process-local realtime state cache.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dawn_core::{ParticipantId, RoomId};
use parking_lot::Mutex;

use super::{CacheResult, PresenceEntry, RealtimeStateCache, TypingEntry};

struct Expiring<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Expiring<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

/// In-memory [`RealtimeStateCache`] with the same TTL semantics as Redis
pub struct MemoryStateCache {
    typing_ttl: Duration,
    presence_ttl: Duration,
    typing: DashMap<(RoomId, ParticipantId), Expiring<TypingEntry>>,
    presence: DashMap<ParticipantId, Expiring<PresenceEntry>>,
    last_seen: Mutex<HashMap<ParticipantId, DateTime<Utc>>>,
}

impl MemoryStateCache {
    pub fn new(typing_ttl: Duration, presence_ttl: Duration) -> Self {
        Self {
            typing_ttl,
            presence_ttl,
            typing: DashMap::new(),
            presence: DashMap::new(),
            last_seen: Mutex::new(HashMap::new()),
        }
    }

    fn refresh_presence(&self, participant_id: ParticipantId, connection_id: Option<&str>) {
        let now = Instant::now();
        let mut slot = self
            .presence
            .entry(participant_id)
            .or_insert_with(|| Expiring::new(PresenceEntry::new(participant_id), self.presence_ttl));

        if !slot.is_live(now) {
            slot.value = PresenceEntry::new(participant_id);
        }
        slot.value.touch();
        if let Some(connection_id) = connection_id {
            slot.value.connections.insert(connection_id.to_string());
        }
        slot.expires_at = now + self.presence_ttl;
        let seen = slot.value.last_heartbeat;
        drop(slot);

        self.last_seen.lock().insert(participant_id, seen);
    }
}

#[async_trait]
impl RealtimeStateCache for MemoryStateCache {
    async fn set_typing(
        &self,
        room_id: RoomId,
        participant_id: ParticipantId,
        display_name: &str,
    ) -> CacheResult<()> {
        let entry = TypingEntry {
            participant_id,
            display_name: display_name.to_string(),
        };
        self.typing
            .insert((room_id, participant_id), Expiring::new(entry, self.typing_ttl));
        Ok(())
    }

    async fn get_typers(&self, room_id: RoomId) -> CacheResult<Vec<TypingEntry>> {
        let now = Instant::now();
        Ok(self
            .typing
            .iter()
            .filter(|slot| slot.key().0 == room_id && slot.is_live(now))
            .map(|slot| slot.value.clone())
            .collect())
    }

    async fn clear_typing(&self, room_id: RoomId, participant_id: ParticipantId) -> CacheResult<()> {
        self.typing.remove(&(room_id, participant_id));
        Ok(())
    }

    async fn cleanup_stale_typing(&self) -> CacheResult<usize> {
        let now = Instant::now();
        let stale: Vec<_> = self
            .typing
            .iter()
            .filter(|slot| !slot.is_live(now))
            .map(|slot| *slot.key())
            .collect();

        let removed = stale
            .into_iter()
            .filter(|key| self.typing.remove_if(key, |_, slot| !slot.is_live(now)).is_some())
            .count();
        Ok(removed)
    }

    async fn set_online(&self, connection_id: &str, participant_id: ParticipantId) -> CacheResult<()> {
        self.refresh_presence(participant_id, Some(connection_id));
        Ok(())
    }

    async fn remove_connection(&self, connection_id: &str, participant_id: ParticipantId) -> CacheResult<()> {
        if let Some(mut slot) = self.presence.get_mut(&participant_id) {
            slot.value.connections.remove(connection_id);
        }
        Ok(())
    }

    async fn heartbeat(&self, participant_id: ParticipantId) -> CacheResult<()> {
        self.refresh_presence(participant_id, None);
        Ok(())
    }

    async fn get_presence(&self, participant_id: ParticipantId) -> CacheResult<Option<PresenceEntry>> {
        let now = Instant::now();
        Ok(self
            .presence
            .get(&participant_id)
            .filter(|slot| slot.is_live(now))
            .map(|slot| slot.value.clone()))
    }

    async fn take_last_seen(&self) -> CacheResult<Vec<(ParticipantId, DateTime<Utc>)>> {
        let drained = std::mem::take(&mut *self.last_seen.lock());
        Ok(drained.into_iter().collect())
    }
}
