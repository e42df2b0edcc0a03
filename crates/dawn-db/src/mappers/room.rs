//! Room entity <-> model mapper

use dawn_core::entities::{Room, RoomSummary, RoomType};
use dawn_core::value_objects::{ParticipantId, RoomId};

use crate::models::{RoomModel, RoomSummaryModel};

impl From<RoomModel> for Room {
    fn from(model: RoomModel) -> Self {
        Room {
            id: RoomId::new(model.id),
            name: model.name,
            room_type: RoomType::from_db(&model.room_type),
            created_by: model.created_by.map(ParticipantId::new),
            icon_url: model.icon_url,
            created_at: model.created_at,
            last_message_at: model.last_message_at,
            last_message_preview: model.last_message_preview,
        }
    }
}

impl From<RoomSummaryModel> for RoomSummary {
    fn from(model: RoomSummaryModel) -> Self {
        RoomSummary {
            room: Room::from(model.room),
            unread_count: model.unread_count,
        }
    }
}
