//! Data transfer objects for service inputs
//!
//! Request DTOs carry `validator` rules checked at the service boundary.

pub mod requests;

pub use requests::{
    AdminMessageRequest, CreateDmRequest, CreateGroupRequest, CreateRoomRequest,
    SendMessageRequest, UpdateProfileRequest, UpdateRoomIconRequest, CONTENT_MAX_CHARS,
};
