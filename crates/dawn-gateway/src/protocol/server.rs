//! Server → client events

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dawn_cache::TypingEntry;
use dawn_core::{Message, ParticipantId, RoomId};
use serde::{Deserialize, Serialize};

/// A serialized event ready for the socket
///
/// Fan-out clones the pointer, not the text.
pub type Frame = Arc<str>;

/// Events the server sends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "ready")]
    Ready(ReadyPayload),

    #[serde(rename = "room:joined")]
    RoomJoined(RoomJoinedPayload),

    #[serde(rename = "message:new")]
    MessageNew(Message),

    #[serde(rename = "room:updated")]
    RoomUpdated(RoomUpdatedPayload),

    #[serde(rename = "typing:update")]
    TypingUpdate(TypingUpdatePayload),

    #[serde(rename = "error")]
    Error(ErrorPayload),
}

impl ServerEvent {
    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "ready",
            Self::RoomJoined(_) => "room:joined",
            Self::MessageNew(_) => "message:new",
            Self::RoomUpdated(_) => "room:updated",
            Self::TypingUpdate(_) => "typing:update",
            Self::Error(_) => "error",
        }
    }

    /// `room:updated` for the room a message was just posted in
    pub fn room_updated(message: &Message) -> Self {
        Self::RoomUpdated(RoomUpdatedPayload {
            room_id: message.room_id,
            last_message_at: message.created_at,
            last_message_preview: message.room_preview(),
        })
    }

    /// `typing:update` with the room's current typers
    pub fn typing_update(room_id: RoomId, typers: Vec<TypingEntry>) -> Self {
        Self::TypingUpdate(TypingUpdatePayload { room_id, typers })
    }

    /// Serialize to a shareable text frame
    pub fn to_frame(&self) -> Result<Frame, serde_json::Error> {
        serde_json::to_string(self).map(Frame::from)
    }

    /// Parse a text frame
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Sent once after the handshake succeeds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub participant_id: ParticipantId,
    pub display_name: String,
    pub connection_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomJoinedPayload {
    pub room_id: RoomId,
}

/// Sidebar refresh for a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomUpdatedPayload {
    pub room_id: RoomId,
    pub last_message_at: DateTime<Utc>,
    pub last_message_preview: String,
}

/// Everyone currently typing in a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingUpdatePayload {
    pub room_id: RoomId,
    pub typers: Vec<TypingEntry>,
}

/// Error scoped to the connection whose event failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    /// Client event that failed, when it could be identified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ready_frame() {
        let frame = ServerEvent::Ready(ReadyPayload {
            participant_id: ParticipantId::new(7),
            display_name: "Ash".to_string(),
            connection_id: "c-1".to_string(),
        })
        .to_frame()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            json!({"event": "ready", "data": {"participant_id": 7, "display_name": "Ash", "connection_id": "c-1"}})
        );
    }

    #[test]
    fn test_room_updated_from_message() {
        let message = Message::new(
            RoomId::new(42),
            ParticipantId::new(1),
            "Ash".to_string(),
            Some("hello".to_string()),
            None,
        );
        let event = ServerEvent::room_updated(&message);
        assert_eq!(event.name(), "room:updated");

        let parsed = ServerEvent::from_json(&event.to_frame().unwrap()).unwrap();
        match parsed {
            ServerEvent::RoomUpdated(payload) => {
                assert_eq!(payload.room_id, RoomId::new(42));
                assert_eq!(payload.last_message_at, message.created_at);
                assert_eq!(payload.last_message_preview, "Ash: hello");
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_message_new_carries_full_record() {
        let message = Message::new(
            RoomId::new(3),
            ParticipantId::new(2),
            "Misty".to_string(),
            None,
            Some("https://img.example/a.png".to_string()),
        );
        let frame = ServerEvent::MessageNew(message.clone()).to_frame().unwrap();
        assert_eq!(ServerEvent::from_json(&frame).unwrap(), ServerEvent::MessageNew(message));
    }

    #[test]
    fn test_error_payload_omits_unknown_event() {
        let frame = ServerEvent::Error(ErrorPayload {
            code: "VALIDATION_ERROR".to_string(),
            message: "malformed frame".to_string(),
            event: None,
        })
        .to_frame()
        .unwrap();
        assert!(!frame.contains("\"event\":\"room"));
        assert!(frame.starts_with("{\"event\":\"error\""));
    }
}
