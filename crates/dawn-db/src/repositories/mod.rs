//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in dawn-core.
//! Each repository handles database operations for a specific domain entity.

mod dm_request;
mod error;
mod member;
mod message;
mod profile;
mod room;

pub use dm_request::PgDmRequestRepository;
pub use member::PgMemberRepository;
pub use message::PgMessageRepository;
pub use profile::PgProfileRepository;
pub use room::PgRoomRepository;
