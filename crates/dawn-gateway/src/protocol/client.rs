//! Client → server events

use dawn_core::{MessageId, ParticipantId, RoomId};
use dawn_service::SendMessageRequest;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::handlers::GatewayError;

/// Events a client may send
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "room:join")]
    JoinRoom(JoinRoomPayload),

    #[serde(rename = "room:leave")]
    LeaveRoom(LeaveRoomPayload),

    #[serde(rename = "message:send")]
    SendMessage(SendMessagePayload),

    #[serde(rename = "typing:start")]
    TypingStart(TypingPayload),

    #[serde(rename = "typing:stop")]
    TypingStop(TypingPayload),

    #[serde(rename = "presence:heartbeat")]
    Heartbeat(HeartbeatPayload),
}

/// Envelope used to tell a bad payload apart from an unknown event
#[derive(Deserialize)]
struct RawFrame {
    event: String,
}

impl ClientEvent {
    /// Event names a client may send
    pub const NAMES: [&'static str; 6] = [
        "room:join",
        "room:leave",
        "message:send",
        "typing:start",
        "typing:stop",
        "presence:heartbeat",
    ];

    /// Parse and validate a text frame
    ///
    /// # Errors
    /// `UNKNOWN_MESSAGE` for an unrecognised event name, `VALIDATION_ERROR`
    /// for anything else that does not match the schema.
    pub fn parse(text: &str) -> Result<Self, GatewayError> {
        let event: Self = serde_json::from_str(text).map_err(|e| {
            match serde_json::from_str::<RawFrame>(text) {
                Ok(raw) if !Self::NAMES.contains(&raw.event.as_str()) => {
                    GatewayError::unknown_event(&raw.event)
                }
                Ok(raw) => GatewayError::validation(format!("invalid {} payload: {e}", raw.event)),
                Err(_) => GatewayError::validation("malformed frame"),
            }
        })?;

        if let Self::SendMessage(payload) = &event {
            payload.validate()?;
        }
        Ok(event)
    }

    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            Self::JoinRoom(_) => "room:join",
            Self::LeaveRoom(_) => "room:leave",
            Self::SendMessage(_) => "message:send",
            Self::TypingStart(_) => "typing:start",
            Self::TypingStop(_) => "typing:stop",
            Self::Heartbeat(_) => "presence:heartbeat",
        }
    }

    /// Serialize to a text frame
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRoomPayload {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveRoomPayload {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct SendMessagePayload {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2048, message = "Image URL must be at most 2048 characters"))]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<MessageId>,
}

impl SendMessagePayload {
    /// Text message from `participant_id`
    pub fn text(room_id: RoomId, participant_id: ParticipantId, content: impl Into<String>) -> Self {
        Self {
            room_id,
            participant_id,
            content: Some(content.into()),
            image_url: None,
            reply_to_id: None,
        }
    }

    /// The service request this payload carries
    pub fn into_request(self) -> SendMessageRequest {
        SendMessageRequest {
            content: self.content,
            image_url: self.image_url.filter(|url| !url.trim().is_empty()),
            reply_to_id: self.reply_to_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingPayload {
    pub room_id: RoomId,
    pub participant_id: ParticipantId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub participant_id: ParticipantId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Result<ClientEvent, GatewayError> {
        ClientEvent::parse(&value.to_string())
    }

    #[test]
    fn test_parse_join() {
        let event = parse(json!({"event": "room:join", "data": {"room_id": 42, "participant_id": "7"}})).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom(JoinRoomPayload {
                room_id: RoomId::new(42),
                participant_id: ParticipantId::new(7),
            })
        );
        assert_eq!(event.name(), "room:join");
    }

    #[test]
    fn test_parse_send_optional_fields() {
        let event = parse(json!({
            "event": "message:send",
            "data": {"room_id": 1, "participant_id": 2, "content": "hello"}
        }))
        .unwrap();
        match event {
            ClientEvent::SendMessage(payload) => {
                assert_eq!(payload.content.as_deref(), Some("hello"));
                assert!(payload.image_url.is_none());
                assert!(payload.reply_to_id.is_none());
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_unknown_event() {
        let err = parse(json!({"event": "room:explode", "data": {}})).unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_MESSAGE");
    }

    #[test]
    fn test_bad_payload_and_garbage() {
        let err = parse(json!({"event": "room:join", "data": {"room_id": "abc"}})).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let err = ClientEvent::parse("not json").unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_oversized_image_url() {
        let err = parse(json!({
            "event": "message:send",
            "data": {"room_id": 1, "participant_id": 2, "image_url": "x".repeat(2049)}
        }))
        .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn test_client_frame_shape() {
        let frame = ClientEvent::Heartbeat(HeartbeatPayload {
            participant_id: ParticipantId::new(9),
        })
        .to_json()
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(value, json!({"event": "presence:heartbeat", "data": {"participant_id": 9}}));
    }

    #[test]
    fn test_into_request_drops_blank_image() {
        let mut payload = SendMessagePayload::text(RoomId::new(1), ParticipantId::new(2), "hi");
        payload.image_url = Some("  ".to_string());
        assert!(payload.into_request().image_url.is_none());
    }
}
