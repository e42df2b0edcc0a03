//! Test fixtures and frame builders

use anyhow::Result;
use dawn_core::{ParticipantId, RoomId, RoomType};
use dawn_gateway::GatewayState;
use dawn_service::{CreateRoomRequest, RoomService};
use serde::Deserialize;
use serde_json::{json, Value};

/// Create a room with the given members directly in the store
pub async fn create_room(state: &GatewayState, name: &str, members: &[i64]) -> Result<RoomId> {
    let room = RoomService::new(state.services())
        .admin_create_room(CreateRoomRequest {
            name: name.to_string(),
            room_type: RoomType::Group,
            member_ids: members.iter().copied().map(ParticipantId::new).collect(),
        })
        .await?;
    Ok(room.id)
}

pub fn join_frame(room_id: RoomId, participant_id: i64) -> Value {
    json!({"event": "room:join", "data": {"room_id": room_id, "participant_id": participant_id}})
}

pub fn leave_frame(room_id: RoomId) -> Value {
    json!({"event": "room:leave", "data": {"room_id": room_id}})
}

pub fn send_frame(room_id: RoomId, participant_id: i64, content: &str) -> Value {
    json!({
        "event": "message:send",
        "data": {"room_id": room_id, "participant_id": participant_id, "content": content}
    })
}

pub fn typing_frame(event: &str, room_id: RoomId, participant_id: i64) -> Value {
    json!({"event": event, "data": {"room_id": room_id, "participant_id": participant_id}})
}

pub fn heartbeat_frame(participant_id: i64) -> Value {
    json!({"event": "presence:heartbeat", "data": {"participant_id": participant_id}})
}

/// `GET /health` body
#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub pubsub: String,
    pub connections: usize,
}
