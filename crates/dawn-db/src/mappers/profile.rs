//! ChatProfile entity <-> model mapper

use dawn_core::entities::ChatProfile;
use dawn_core::value_objects::ParticipantId;

use crate::models::ChatProfileModel;

impl From<ChatProfileModel> for ChatProfile {
    fn from(model: ChatProfileModel) -> Self {
        ChatProfile {
            participant_id: ParticipantId::new(model.participant_id),
            nickname: model.nickname,
            avatar_url: model.avatar_url,
            last_seen_at: model.last_seen_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}
