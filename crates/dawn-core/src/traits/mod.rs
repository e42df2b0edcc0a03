//! Store traits implemented by the infrastructure layer

mod repositories;

pub use repositories::{
    DmRequestRepository, HistoryCursor, MemberRepository, MessageQuery, MessageRepository,
    ProfileRepository, RepoResult, RoomRepository, DEFAULT_HISTORY_LIMIT, MAX_HISTORY_LIMIT,
};
