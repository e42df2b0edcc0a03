//! Repository traits (ports) - define the interface for chat data access
//!
//! The domain layer defines what it needs, and the infrastructure layer
//! provides the implementation (PostgreSQL, or in-memory for tests).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{
    ChatProfile, DmRequest, DmRequestStatus, MemberRole, Message, NewRoom, Room, RoomMember,
    RoomSummary,
};
use crate::error::DomainError;
use crate::value_objects::{DmRequestId, MessageId, ParticipantId, RoomId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// Room Repository
// ============================================================================

#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Find room by ID
    async fn find_by_id(&self, id: RoomId) -> RepoResult<Option<Room>>;

    /// Create a room together with its initial members in one unit of work
    ///
    /// Fails with `ValidationError` when `members` is empty.
    async fn create_with_members(
        &self,
        room: &NewRoom,
        members: &[(ParticipantId, MemberRole)],
    ) -> RepoResult<Room>;

    /// Find the DM room shared by two participants
    async fn find_dm_between(&self, a: ParticipantId, b: ParticipantId) -> RepoResult<Option<Room>>;

    /// List rooms a participant belongs to, most recently active first
    async fn find_for_participant(&self, participant_id: ParticipantId) -> RepoResult<Vec<RoomSummary>>;

    /// List every room (administrative view)
    async fn find_all(&self) -> RepoResult<Vec<Room>>;

    /// Record the latest message time and sidebar preview
    async fn update_last_message(
        &self,
        id: RoomId,
        at: DateTime<Utc>,
        preview: &str,
    ) -> RepoResult<()>;

    /// Set or clear the room icon, returning the updated room
    async fn update_icon(&self, id: RoomId, icon_url: Option<&str>) -> RepoResult<Room>;

    /// Hard delete a room with its members and messages; returns false if absent
    async fn delete(&self, id: RoomId) -> RepoResult<bool>;
}

// ============================================================================
// Member Repository
// ============================================================================

#[async_trait]
pub trait MemberRepository: Send + Sync {
    /// Check if participant is a member of room
    async fn is_member(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<bool>;

    /// Find a single membership record
    async fn find(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<Option<RoomMember>>;

    /// List members of a room
    async fn find_by_room(&self, room_id: RoomId) -> RepoResult<Vec<RoomMember>>;

    /// Add participant to room; `AlreadyMember` if present
    async fn add(&self, room_id: RoomId, participant_id: ParticipantId, role: MemberRole) -> RepoResult<RoomMember>;

    /// Remove participant from room; returns false if they were not a member
    async fn remove(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<bool>;

    /// Set the member's last-read timestamp to now
    async fn mark_read(&self, room_id: RoomId, participant_id: ParticipantId) -> RepoResult<()>;
}

// ============================================================================
// Message Repository
// ============================================================================

/// Default page size for history queries
pub const DEFAULT_HISTORY_LIMIT: i64 = 50;

/// Largest page a single history query returns
pub const MAX_HISTORY_LIMIT: i64 = 100;

/// Where an older-history page starts
///
/// History is ordered by `(created_at, insertion order)`. Several messages can
/// share a timestamp, so only the message cursor pages without gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCursor {
    /// Messages strictly older than this instant
    Time(DateTime<Utc>),
    /// Messages stored before this one; `MessageNotFound` if it is not in the room
    Message(MessageId),
}

impl From<DateTime<Utc>> for HistoryCursor {
    fn from(at: DateTime<Utc>) -> Self {
        Self::Time(at)
    }
}

impl From<MessageId> for HistoryCursor {
    fn from(id: MessageId) -> Self {
        Self::Message(id)
    }
}

/// Pagination options for message queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageQuery {
    pub before: Option<HistoryCursor>,
    pub limit: i64,
}

impl Default for MessageQuery {
    fn default() -> Self {
        Self {
            before: None,
            limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

impl MessageQuery {
    /// Most recent `limit` messages
    pub fn latest(limit: i64) -> Self {
        Self { before: None, limit }
    }

    /// `limit` messages older than `before`
    pub fn before(before: impl Into<HistoryCursor>, limit: i64) -> Self {
        Self {
            before: Some(before.into()),
            limit,
        }
    }

    /// Limit clamped to `1..=MAX_HISTORY_LIMIT`
    pub fn effective_limit(&self) -> i64 {
        self.limit.clamp(1, MAX_HISTORY_LIMIT)
    }
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Find message by ID (including soft-deleted ones)
    async fn find_by_id(&self, id: MessageId) -> RepoResult<Option<Message>>;

    /// List non-deleted messages in a room, newest first
    ///
    /// Messages with equal timestamps come back in reverse insertion order.
    async fn find_by_room(&self, room_id: RoomId, query: MessageQuery) -> RepoResult<Vec<Message>>;

    /// Persist a new message
    async fn create(&self, message: &Message) -> RepoResult<()>;

    /// Soft delete a message (moderation); returns false if absent or already deleted
    async fn soft_delete(&self, id: MessageId) -> RepoResult<bool>;
}

// ============================================================================
// DM Request Repository
// ============================================================================

#[async_trait]
pub trait DmRequestRepository: Send + Sync {
    /// Find request by ID
    async fn find_by_id(&self, id: DmRequestId) -> RepoResult<Option<DmRequest>>;

    /// Find a pending request sent from `from` to `to` (one direction only)
    async fn find_pending_between(&self, from: ParticipantId, to: ParticipantId) -> RepoResult<Option<DmRequest>>;

    /// List requests sent or received by a participant, newest first
    async fn find_for_participant(&self, participant_id: ParticipantId) -> RepoResult<Vec<DmRequest>>;

    /// Create a pending request
    async fn create(
        &self,
        from: ParticipantId,
        to: ParticipantId,
        message: Option<&str>,
    ) -> RepoResult<DmRequest>;

    /// Move a request to a new status
    async fn update_status(&self, id: DmRequestId, status: DmRequestStatus) -> RepoResult<DmRequest>;
}

// ============================================================================
// Profile Repository
// ============================================================================

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find profile by participant
    async fn find(&self, participant_id: ParticipantId) -> RepoResult<Option<ChatProfile>>;

    /// Insert the profile, or return the existing one untouched
    async fn insert_if_absent(&self, profile: &ChatProfile) -> RepoResult<ChatProfile>;

    /// Update nickname and avatar
    async fn update(&self, profile: &ChatProfile) -> RepoResult<()>;

    /// Record the last time the participant was seen online
    async fn record_last_seen(&self, participant_id: ParticipantId, at: DateTime<Utc>) -> RepoResult<()>;
}
