//! # dawn-service
//!
//! Application layer for chat: profile, room, DM and message services plus
//! the request DTOs they validate.

pub mod dto;
pub mod services;

pub use dto::{
    AdminMessageRequest, CreateDmRequest, CreateGroupRequest, CreateRoomRequest,
    SendMessageRequest, UpdateProfileRequest, UpdateRoomIconRequest, CONTENT_MAX_CHARS,
};
pub use services::{
    DmRequestOutcome, DmService, MessageService, ProfileService, RoomService, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult,
};
