//! Direct message service
//!
//! Handles DM requests and opens DM rooms once a request is accepted.

use dawn_core::entities::{DmRequest, DmRequestStatus, MemberRole, NewRoom, Room};
use dawn_core::{DmRequestId, DomainError, ParticipantId};
use tracing::{info, instrument};
use validator::Validate;

use crate::dto::CreateDmRequest;

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Result of sending a DM request
#[derive(Debug, Clone)]
pub enum DmRequestOutcome {
    /// Waiting on the recipient
    Pending(DmRequest),
    /// The recipient had already asked the sender, so the DM is open
    Accepted { request: DmRequest, room: Room },
}

/// DM service
pub struct DmService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> DmService<'a> {
    /// Create a new DmService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Ask another participant to open a DM
    #[instrument(skip(self, request), fields(to = %request.to_participant_id))]
    pub async fn send_request(
        &self,
        from: ParticipantId,
        request: CreateDmRequest,
    ) -> ServiceResult<DmRequestOutcome> {
        request.validate()?;
        let to = request.to_participant_id;

        if from == to {
            return Err(DomainError::CannotDmSelf.into());
        }

        if self.ctx.room_repo().find_dm_between(from, to).await?.is_some() {
            return Err(DomainError::DmRoomExists.into());
        }

        if let Some(reverse) = self.ctx.dm_request_repo().find_pending_between(to, from).await? {
            let (request, room) = self.open(reverse).await?;
            info!(request_id = %request.id, room_id = %room.id, "Crossed DM requests accepted");
            return Ok(DmRequestOutcome::Accepted { request, room });
        }

        let message = request
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty());

        let created = self.ctx.dm_request_repo().create(from, to, message).await?;
        info!(request_id = %created.id, from = %from, to = %to, "DM request sent");
        Ok(DmRequestOutcome::Pending(created))
    }

    /// Accept a pending request addressed to `participant_id`
    #[instrument(skip(self))]
    pub async fn accept(
        &self,
        request_id: DmRequestId,
        participant_id: ParticipantId,
    ) -> ServiceResult<(DmRequest, Room)> {
        let request = self.find_actionable(request_id, participant_id).await?;
        let (request, room) = self.open(request).await?;
        info!(request_id = %request.id, room_id = %room.id, "DM request accepted");
        Ok((request, room))
    }

    /// Decline a pending request addressed to `participant_id`
    #[instrument(skip(self))]
    pub async fn decline(
        &self,
        request_id: DmRequestId,
        participant_id: ParticipantId,
    ) -> ServiceResult<DmRequest> {
        let request = self.find_actionable(request_id, participant_id).await?;
        let request = self
            .ctx
            .dm_request_repo()
            .update_status(request.id, DmRequestStatus::Declined)
            .await?;
        info!(request_id = %request.id, "DM request declined");
        Ok(request)
    }

    /// Requests sent or received by a participant, newest first
    pub async fn list_requests(&self, participant_id: ParticipantId) -> ServiceResult<Vec<DmRequest>> {
        Ok(self.ctx.dm_request_repo().find_for_participant(participant_id).await?)
    }

    async fn find_actionable(
        &self,
        request_id: DmRequestId,
        participant_id: ParticipantId,
    ) -> ServiceResult<DmRequest> {
        let request = self
            .ctx
            .dm_request_repo()
            .find_by_id(request_id)
            .await?
            .ok_or(DomainError::DmRequestNotFound(request_id))?;

        if request.to_participant_id != participant_id {
            return Err(DomainError::NotRequestRecipient.into());
        }
        if !request.is_pending() {
            return Err(DomainError::DmRequestNotPending.into());
        }
        Ok(request)
    }

    // Room first; a failed insert leaves the request pending
    async fn open(&self, request: DmRequest) -> ServiceResult<(DmRequest, Room)> {
        let (a, b) = (request.from_participant_id, request.to_participant_id);

        let room = match self.ctx.room_repo().find_dm_between(a, b).await? {
            Some(room) => room,
            None => {
                self.ctx
                    .room_repo()
                    .create_with_members(
                        &NewRoom::dm(),
                        &[(a, MemberRole::Member), (b, MemberRole::Member)],
                    )
                    .await?
            }
        };

        let request = self
            .ctx
            .dm_request_repo()
            .update_status(request.id, DmRequestStatus::Accepted)
            .await?;
        Ok((request, room))
    }
}
