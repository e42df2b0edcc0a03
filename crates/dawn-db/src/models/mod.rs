//! Database models - SQLx-compatible structs for PostgreSQL tables

mod dm_request;
mod member;
mod message;
mod profile;
mod room;

pub use dm_request::DmRequestModel;
pub use member::RoomMemberModel;
pub use message::MessageModel;
pub use profile::ChatProfileModel;
pub use room::{RoomModel, RoomSummaryModel};
