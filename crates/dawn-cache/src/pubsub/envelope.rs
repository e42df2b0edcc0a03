//! Envelope carried over the pub/sub channel.

use dawn_core::{ParticipantId, RoomId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Event wrapper for Pub/Sub messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PubSubEvent {
    /// Node id of the publishing process
    pub origin: Uuid,
    /// Which local connections should receive the event
    pub target: EventTarget,
    /// Event name (e.g., "message:new", "typing:update")
    pub event_type: String,
    /// Serialized server event
    pub data: serde_json::Value,
}

/// Delivery target of a bridged event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventTarget {
    /// Connections subscribed to a room, optionally minus one participant
    Room {
        room_id: RoomId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exclude: Option<ParticipantId>,
    },
    /// Every connection
    All,
}

impl EventTarget {
    /// Every subscriber of a room
    #[must_use]
    pub fn room(room_id: RoomId) -> Self {
        Self::Room {
            room_id,
            exclude: None,
        }
    }

    /// Every subscriber of a room except one participant
    #[must_use]
    pub fn room_except(room_id: RoomId, participant_id: ParticipantId) -> Self {
        Self::Room {
            room_id,
            exclude: Some(participant_id),
        }
    }
}

impl PubSubEvent {
    /// Create a new event
    #[must_use]
    pub fn new(
        origin: Uuid,
        target: EventTarget,
        event_type: impl Into<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            origin,
            target,
            event_type: event_type.into(),
            data,
        }
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
