//! Domain entities - core chat objects

mod dm_request;
mod member;
mod message;
mod profile;
mod room;

pub use dm_request::{DmRequest, DmRequestStatus};
pub use member::{MemberRole, RoomMember, RoomMemberInfo, UNKNOWN_NICKNAME};
pub use message::{truncate_chars, Message, ReplyPreview, REPLY_PREVIEW_CHARS};
pub use profile::{ChatProfile, NICKNAME_MAX_CHARS};
pub use room::{NewRoom, Room, RoomSummary, RoomType, RoomWithMembers};
