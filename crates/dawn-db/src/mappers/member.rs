//! RoomMember entity <-> model mapper

use dawn_core::entities::{MemberRole, RoomMember};
use dawn_core::value_objects::{ParticipantId, RoomId};

use crate::models::RoomMemberModel;

impl From<RoomMemberModel> for RoomMember {
    fn from(model: RoomMemberModel) -> Self {
        RoomMember {
            room_id: RoomId::new(model.room_id),
            participant_id: ParticipantId::new(model.participant_id),
            role: MemberRole::from_db(&model.role),
            joined_at: model.joined_at,
            last_read_at: model.last_read_at,
        }
    }
}
