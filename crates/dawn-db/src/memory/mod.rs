//! In-memory chat store
//!
//! Implements every repository trait over a single lock-protected state so a
//! gateway can run without PostgreSQL (development, tests). Semantics follow
//! the PostgreSQL repositories: unique membership, one pending request per
//! direction, soft-deleted messages hidden from history.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::{DateTime, SubsecRound, Utc};
use parking_lot::RwLock;

use dawn_core::entities::{
    ChatProfile, DmRequest, DmRequestStatus, MemberRole, Message, NewRoom, Room, RoomMember,
    RoomSummary,
};
use dawn_core::error::DomainError;
use dawn_core::traits::{
    DmRequestRepository, HistoryCursor, MemberRepository, MessageQuery, MessageRepository,
    ProfileRepository, RepoResult, RoomRepository,
};
use dawn_core::value_objects::{DmRequestId, MessageId, ParticipantId, RoomId};

/// A message with its insertion sequence, the tiebreaker for equal timestamps
struct StoredMessage {
    seq: u64,
    message: Message,
}

impl StoredMessage {
    fn position(&self) -> (DateTime<Utc>, u64) {
        (self.message.created_at, self.seq)
    }
}

#[derive(Default)]
struct State {
    next_room_id: i64,
    next_request_id: i64,
    next_message_seq: u64,
    rooms: BTreeMap<RoomId, Room>,
    members: BTreeMap<(RoomId, ParticipantId), RoomMember>,
    messages: HashMap<MessageId, StoredMessage>,
    requests: BTreeMap<DmRequestId, DmRequest>,
    profiles: HashMap<ParticipantId, ChatProfile>,
}

impl State {
    fn allocate_room_id(&mut self) -> RoomId {
        self.next_room_id += 1;
        RoomId::new(self.next_room_id)
    }

    fn allocate_request_id(&mut self) -> DmRequestId {
        self.next_request_id += 1;
        DmRequestId::new(self.next_request_id)
    }

    fn unread_count(&self, member: &RoomMember) -> i64 {
        let count = self
            .messages
            .values()
            .map(|stored| &stored.message)
            .filter(|m| {
                m.room_id == member.room_id
                    && !m.deleted
                    && m.sender_id != member.participant_id
                    && member.is_unread(m.created_at)
            })
            .count();
        i64::try_from(count).unwrap_or(i64::MAX)
    }
}

/// Process-local implementation of every chat repository
#[derive(Default)]
pub struct MemoryChatStore {
    state: RwLock<State>,
}

impl MemoryChatStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait]
impl RoomRepository for MemoryChatStore {
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>> {
        Ok(self.state.read().rooms.get(&id).cloned())
    }

    async fn create_with_members(
        &self,
        room: &NewRoom,
        members: &[(ParticipantId, MemberRole)],
    ) -> RepoResult<Room> {
        if members.is_empty() {
            return Err(DomainError::ValidationError(
                "a room needs at least one member".to_string(),
            ));
        }

        let mut state = self.state.write();
        let id = state.allocate_room_id();
        let created = Room {
            id,
            name: room.name.clone(),
            room_type: room.room_type,
            created_by: room.created_by,
            icon_url: None,
            created_at: now(),
            last_message_at: None,
            last_message_preview: None,
        };
        state.rooms.insert(id, created.clone());

        for &(participant_id, role) in members {
            state
                .members
                .entry((id, participant_id))
                .or_insert_with(|| RoomMember::new(id, participant_id, role));
        }

        Ok(created)
    }

    async fn find_dm_between(&self, a: ParticipantId, b: ParticipantId) -> RepoResult<Option<Room>> {
        let state = self.state.read();
        let room = state
            .rooms
            .values()
            .find(|r| {
                r.is_dm()
                    && state.members.contains_key(&(r.id, a))
                    && state.members.contains_key(&(r.id, b))
            })
            .cloned();
        Ok(room)
    }

    async fn find_for_participant(&self, participant_id: ParticipantId) -> RepoResult<Vec<RoomSummary>> {
        let state = self.state.read();
        let mut summaries: Vec<RoomSummary> = state
            .members
            .values()
            .filter(|m| m.participant_id == participant_id)
            .filter_map(|member| {
                state.rooms.get(&member.room_id).map(|room| RoomSummary {
                    room: room.clone(),
                    unread_count: state.unread_count(member),
                })
            })
            .collect();

        summaries.sort_by(|a, b| {
            let activity = |s: &RoomSummary| s.room.last_message_at.unwrap_or(s.room.created_at);
            activity(b)
                .cmp(&activity(a))
                .then_with(|| b.room.id.cmp(&a.room.id))
        });
        Ok(summaries)
    }

    async fn find_all(&self) -> RepoResult<Vec<Room>> {
        Ok(self.state.read().rooms.values().cloned().collect())
    }

    async fn update_last_message(
        &self,
        id: RoomId,
        at: DateTime<Utc>,
        preview: &str,
    ) -> RepoResult<()> {
        let mut state = self.state.write();
        let room = state.rooms.get_mut(&id).ok_or(DomainError::RoomNotFound(id))?;
        room.last_message_at = Some(at);
        room.last_message_preview = Some(preview.to_string());
        Ok(())
    }

    async fn update_icon(&self, id: RoomId, icon_url: Option<&str>) -> RepoResult<Room> {
        let mut state = self.state.write();
        let room = state.rooms.get_mut(&id).ok_or(DomainError::RoomNotFound(id))?;
        room.icon_url = icon_url.map(str::to_string);
        Ok(room.clone())
    }

    async fn delete(&self, id: RoomId) -> RepoResult<bool> {
        let mut state = self.state.write();
        if state.rooms.remove(&id).is_none() {
            return Ok(false);
        }
        state.members.retain(|(room_id, _), _| *room_id != id);
        state.messages.retain(|_, stored| stored.message.room_id != id);
        Ok(true)
    }
}

#[async_trait]
impl MemberRepository for MemoryChatStore {
    async fn is_member(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<bool> {
        Ok(self.state.read().members.contains_key(&(room_id, participant_id)))
    }

    async fn find(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<Option<RoomMember>> {
        Ok(self.state.read().members.get(&(room_id, participant_id)).cloned())
    }

    async fn find_by_room(&self, room_id: RoomId) -> RepoResult<Vec<RoomMember>> {
        let state = self.state.read();
        let mut members: Vec<RoomMember> = state
            .members
            .range((room_id, ParticipantId::new(i64::MIN))..=(room_id, ParticipantId::new(i64::MAX)))
            .map(|(_, m)| m.clone())
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn add(&self, room_id: RoomId, participant_id: ParticipantId, role: MemberRole) -> RepoResult<RoomMember> {
        let mut state = self.state.write();
        if !state.rooms.contains_key(&room_id) {
            return Err(DomainError::RoomNotFound(room_id));
        }
        if state.members.contains_key(&(room_id, participant_id)) {
            return Err(DomainError::AlreadyMember);
        }
        let member = RoomMember::new(room_id, participant_id, role);
        state.members.insert((room_id, participant_id), member.clone());
        Ok(member)
    }

    async fn remove(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<bool> {
        Ok(self.state.write().members.remove(&(room_id, participant_id)).is_some())
    }

    async fn mark_read(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<()> {
        let mut state = self.state.write();
        let member = state
            .members
            .get_mut(&(room_id, participant_id))
            .ok_or(DomainError::MemberNotFound)?;
        member.last_read_at = Some(now());
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for MemoryChatStore {
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>> {
        Ok(self.state.read().messages.get(&id).map(|stored| stored.message.clone()))
    }

    async fn find_by_room(&self, room_id: RoomId, query: MessageQuery) -> RepoResult<Vec<Message>> {
        let state = self.state.read();

        let anchor = match query.before {
            Some(HistoryCursor::Message(anchor_id)) => match state.messages.get(&anchor_id) {
                Some(stored) if stored.message.room_id == room_id => Some(stored.position()),
                _ => return Err(DomainError::MessageNotFound(anchor_id)),
            },
            _ => None,
        };

        let mut page: Vec<&StoredMessage> = state
            .messages
            .values()
            .filter(|stored| stored.message.room_id == room_id && !stored.message.deleted)
            .filter(|stored| match query.before {
                Some(HistoryCursor::Time(before)) => stored.message.created_at < before,
                _ => anchor.map_or(true, |anchor| stored.position() < anchor),
            })
            .collect();

        page.sort_by(|a, b| b.position().cmp(&a.position()));
        page.truncate(usize::try_from(query.effective_limit()).unwrap_or(usize::MAX));
        Ok(page.into_iter().map(|stored| stored.message.clone()).collect())
    }

    async fn create(&self, message: &Message) -> RepoResult<()> {
        let mut state = self.state.write();
        if !state.rooms.contains_key(&message.room_id) {
            return Err(DomainError::RoomNotFound(message.room_id));
        }
        state.next_message_seq += 1;
        let seq = state.next_message_seq;
        state.messages.insert(
            message.id,
            StoredMessage {
                seq,
                message: message.clone(),
            },
        );
        Ok(())
    }

    async fn soft_delete(&self, id: MessageId) -> RepoResult<bool> {
        let mut state = self.state.write();
        match state.messages.get_mut(&id) {
            Some(stored) if !stored.message.deleted => {
                stored.message.deleted = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl DmRequestRepository for MemoryChatStore {
    async fn find_by_id(&self, id: DmRequestId) -> RepoResult<Option<DmRequest>> {
        Ok(self.state.read().requests.get(&id).cloned())
    }

    async fn find_pending_between(&self, from: ParticipantId, to: ParticipantId) -> RepoResult<Option<DmRequest>> {
        let state = self.state.read();
        Ok(state
            .requests
            .values()
            .find(|r| r.is_pending() && r.from_participant_id == from && r.to_participant_id == to)
            .cloned())
    }

    async fn find_for_participant(&self, participant_id: ParticipantId) -> RepoResult<Vec<DmRequest>> {
        let state = self.state.read();
        let mut requests: Vec<DmRequest> = state
            .requests
            .values()
            .filter(|r| r.involves(participant_id))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(requests)
    }

    async fn create(
        &self,
        from: ParticipantId,
        to: ParticipantId,
        message: Option<&str>,
    ) -> RepoResult<DmRequest> {
        let mut state = self.state.write();
        let duplicate = state
            .requests
            .values()
            .any(|r| r.is_pending() && r.from_participant_id == from && r.to_participant_id == to);
        if duplicate {
            return Err(DomainError::DmRequestAlreadySent);
        }

        let id = state.allocate_request_id();
        let at = now();
        let request = DmRequest {
            id,
            from_participant_id: from,
            to_participant_id: to,
            message: message.map(str::to_string),
            status: DmRequestStatus::Pending,
            created_at: at,
            updated_at: at,
        };
        state.requests.insert(id, request.clone());
        Ok(request)
    }

    async fn update_status(&self, id: DmRequestId, status: DmRequestStatus) -> RepoResult<DmRequest> {
        let mut state = self.state.write();
        let request = state
            .requests
            .get_mut(&id)
            .ok_or(DomainError::DmRequestNotFound(id))?;
        request.status = status;
        request.updated_at = now();
        Ok(request.clone())
    }
}

#[async_trait]
impl ProfileRepository for MemoryChatStore {
    async fn find(&self, participant_id: ParticipantId) -> RepoResult<Option<ChatProfile>> {
        Ok(self.state.read().profiles.get(&participant_id).cloned())
    }

    async fn insert_if_absent(&self, profile: &ChatProfile) -> RepoResult<ChatProfile> {
        let mut state = self.state.write();
        let stored = state
            .profiles
            .entry(profile.participant_id)
            .or_insert_with(|| profile.clone());
        Ok(stored.clone())
    }

    async fn update(&self, profile: &ChatProfile) -> RepoResult<()> {
        let mut state = self.state.write();
        let stored = state
            .profiles
            .get_mut(&profile.participant_id)
            .ok_or(DomainError::ProfileNotFound(profile.participant_id))?;
        stored.nickname = profile.nickname.clone();
        stored.avatar_url = profile.avatar_url.clone();
        stored.updated_at = now();
        Ok(())
    }

    async fn record_last_seen(&self, participant_id: ParticipantId, at: DateTime<Utc>) -> RepoResult<()> {
        let mut state = self.state.write();
        if let Some(profile) = state.profiles.get_mut(&participant_id) {
            if profile.last_seen_at.map_or(true, |seen| at > seen) {
                profile.last_seen_at = Some(at);
            }
        }
        Ok(())
    }
}
