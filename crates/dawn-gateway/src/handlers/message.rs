//! message:send

use std::sync::Arc;

use dawn_cache::EventTarget;
use dawn_service::MessageService;

use super::{ensure_identity, GatewayResult, TypingHandler};
use crate::connection::Connection;
use crate::protocol::{SendMessagePayload, ServerEvent};
use crate::server::GatewayState;

/// Handles message sends
pub struct MessageHandler;

impl MessageHandler {
    /// Persist a message and fan it out
    ///
    /// Order: `message:new` to the room (sender included), then the sender's
    /// typing indicator is cleared for the others, then `room:updated` to
    /// every connection. Nothing is broadcast unless the message was stored.
    pub async fn send(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: SendMessagePayload,
    ) -> GatewayResult<()> {
        ensure_identity(connection, payload.participant_id)?;

        let room_id = payload.room_id;
        let sender = payload.participant_id;

        let message = MessageService::new(state.services())
            .send(room_id, sender, payload.into_request())
            .await?;

        state
            .bridge()
            .emit(EventTarget::room(room_id), &ServerEvent::MessageNew(message.clone()))
            .await;

        TypingHandler::clear(state, room_id, sender).await;

        // Every connection, member or not
        state
            .bridge()
            .emit(EventTarget::All, &ServerEvent::room_updated(&message))
            .await;

        tracing::debug!(
            message_id = %message.id,
            room_id = %room_id,
            participant_id = %sender,
            "Message delivered"
        );
        Ok(())
    }
}
