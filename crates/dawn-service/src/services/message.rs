//! Message service
//!
//! Sending, history, and moderation of chat messages.

use dawn_core::entities::{Message, ReplyPreview};
use dawn_core::traits::{HistoryCursor, MessageQuery, DEFAULT_HISTORY_LIMIT};
use dawn_core::{DomainError, MessageId, ParticipantId, RoomId};
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::dto::{AdminMessageRequest, SendMessageRequest, CONTENT_MAX_CHARS};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::profile::ProfileService;
use super::room::RoomService;

/// Sender name used for administrator messages without one
const UNKNOWN_SENDER: &str = "Unknown";

/// Message service
pub struct MessageService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> MessageService<'a> {
    /// Create a new MessageService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Persist a message from a room member
    ///
    /// Content is trimmed; a message needs text or an image. The sender's
    /// nickname and avatar are copied from their chat profile, and a reply
    /// must point at a live message in the same room.
    #[instrument(skip(self, request), fields(room_id = %room_id, sender = %sender))]
    pub async fn send(
        &self,
        room_id: RoomId,
        sender: ParticipantId,
        request: SendMessageRequest,
    ) -> ServiceResult<Message> {
        request.validate()?;

        let content = request
            .content
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let image_url = request
            .image_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        if content.is_none() && image_url.is_none() {
            return Err(DomainError::EmptyMessage.into());
        }
        if content.as_deref().is_some_and(|c| c.chars().count() > CONTENT_MAX_CHARS) {
            return Err(DomainError::ContentTooLong { max: CONTENT_MAX_CHARS }.into());
        }

        RoomService::new(self.ctx).require_member(room_id, sender).await?;

        let reply_to = match request.reply_to_id {
            Some(reply_id) => Some(self.reply_target(room_id, reply_id).await?),
            None => None,
        };

        let profile = ProfileService::new(self.ctx).get_or_create(sender, None).await?;

        let message = Message::new(room_id, sender, profile.nickname, content, image_url)
            .with_avatar(profile.avatar_url)
            .with_reply(reply_to);

        self.persist(&message).await?;

        info!(message_id = %message.id, "Message sent");
        Ok(message)
    }

    /// Most recent messages, newest first
    #[instrument(skip(self))]
    pub async fn get_recent(
        &self,
        room_id: RoomId,
        requester: ParticipantId,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<Message>> {
        RoomService::new(self.ctx).require_member(room_id, requester).await?;
        let query = MessageQuery::latest(limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
        Ok(self.ctx.message_repo().find_by_room(room_id, query).await?)
    }

    /// Messages older than `before`, newest first
    ///
    /// Pass the oldest message already shown to page without gaps; a timestamp
    /// cursor skips messages that share the boundary instant.
    #[instrument(skip(self, before))]
    pub async fn get_older(
        &self,
        room_id: RoomId,
        requester: ParticipantId,
        before: impl Into<HistoryCursor>,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<Message>> {
        RoomService::new(self.ctx).require_member(room_id, requester).await?;
        let query = MessageQuery::before(before, limit.unwrap_or(DEFAULT_HISTORY_LIMIT));
        Ok(self.ctx.message_repo().find_by_room(room_id, query).await?)
    }

    /// Post a message as the system sender (participant id 0)
    #[instrument(skip(self, request))]
    pub async fn admin_message(
        &self,
        room_id: RoomId,
        request: AdminMessageRequest,
    ) -> ServiceResult<Message> {
        request.validate()?;

        let content = request.content.trim();
        if content.is_empty() {
            return Err(DomainError::EmptyMessage.into());
        }

        RoomService::new(self.ctx).get_room(room_id).await?;

        let sender_name = request
            .sender_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(UNKNOWN_SENDER)
            .to_string();

        let message = Message::new(
            room_id,
            ParticipantId::SYSTEM,
            sender_name,
            Some(content.to_string()),
            None,
        );

        self.persist(&message).await?;

        info!(message_id = %message.id, room_id = %room_id, "Administrator message posted");
        Ok(message)
    }

    /// Soft delete a message so it no longer appears in history
    #[instrument(skip(self))]
    pub async fn moderate_delete(&self, message_id: MessageId) -> ServiceResult<()> {
        if !self.ctx.message_repo().soft_delete(message_id).await? {
            return Err(DomainError::MessageNotFound(message_id).into());
        }
        info!(message_id = %message_id, "Message removed by moderation");
        Ok(())
    }

    async fn reply_target(&self, room_id: RoomId, reply_id: MessageId) -> ServiceResult<ReplyPreview> {
        match self.ctx.message_repo().find_by_id(reply_id).await? {
            Some(target) if target.room_id == room_id && !target.deleted => Ok(target.reply_preview()),
            _ => Err(DomainError::InvalidReplyTarget.into()),
        }
    }

    // Room metadata is best effort once the message itself is stored
    async fn persist(&self, message: &Message) -> ServiceResult<()> {
        self.ctx.message_repo().create(message).await?;

        if let Err(e) = self
            .ctx
            .room_repo()
            .update_last_message(message.room_id, message.created_at, &message.room_preview())
            .await
        {
            warn!(room_id = %message.room_id, error = %e, "Failed to update room preview");
        }
        Ok(())
    }
}
