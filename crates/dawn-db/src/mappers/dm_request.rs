//! DmRequest entity <-> model mapper

use dawn_core::entities::{DmRequest, DmRequestStatus};
use dawn_core::error::DomainError;
use dawn_core::value_objects::{DmRequestId, ParticipantId};

use crate::models::DmRequestModel;

impl TryFrom<DmRequestModel> for DmRequest {
    type Error = DomainError;

    fn try_from(model: DmRequestModel) -> Result<Self, Self::Error> {
        let status = DmRequestStatus::from_db(&model.status).ok_or_else(|| {
            DomainError::DatabaseError(format!("unknown DM request status: {}", model.status))
        })?;

        Ok(DmRequest {
            id: DmRequestId::new(model.id),
            from_participant_id: ParticipantId::new(model.from_participant_id),
            to_participant_id: ParticipantId::new(model.to_participant_id),
            message: model.message,
            status,
            created_at: model.created_at,
            updated_at: model.updated_at,
        })
    }
}
