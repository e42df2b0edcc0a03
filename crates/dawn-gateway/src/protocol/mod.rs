//! Wire protocol
//!
//! Every frame is JSON text shaped `{"event": "<name>", "data": {...}}`.

mod client;
mod server;

pub use client::{
    ClientEvent, HeartbeatPayload, JoinRoomPayload, LeaveRoomPayload, SendMessagePayload,
    TypingPayload,
};
pub use server::{
    ErrorPayload, Frame, ReadyPayload, RoomJoinedPayload, RoomUpdatedPayload, ServerEvent,
    TypingUpdatePayload,
};
