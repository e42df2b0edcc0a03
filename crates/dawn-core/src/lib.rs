//! # dawn-core
//!
//! Domain layer for Dusk and Dawn chat: rooms, members, messages, DM requests,
//! chat profiles, typed identifiers, and the store traits the infrastructure
//! crates implement. No database, cache, or web framework dependencies.

pub mod entities;
pub mod error;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    truncate_chars, ChatProfile, DmRequest, DmRequestStatus, MemberRole, Message, NewRoom,
    ReplyPreview, Room, RoomMember, RoomMemberInfo, RoomSummary, RoomType, RoomWithMembers,
    NICKNAME_MAX_CHARS, REPLY_PREVIEW_CHARS, UNKNOWN_NICKNAME,
};
pub use error::DomainError;
pub use traits::{
    DmRequestRepository, HistoryCursor, MemberRepository, MessageQuery, MessageRepository,
    ProfileRepository, RepoResult, RoomRepository, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
pub use value_objects::{DmRequestId, IdParseError, MessageId, ParticipantId, RoomId};
