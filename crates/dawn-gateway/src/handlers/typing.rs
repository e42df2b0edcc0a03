//! typing:start / typing:stop

use std::sync::Arc;

use dawn_cache::EventTarget;
use dawn_core::{ParticipantId, RoomId};

use super::{ensure_identity, GatewayError, GatewayResult};
use crate::connection::Connection;
use crate::protocol::{ServerEvent, TypingPayload};
use crate::server::GatewayState;

/// Handles typing indicators
///
/// Cache failures are logged and never reported to the client.
pub struct TypingHandler;

impl TypingHandler {
    pub async fn start(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: TypingPayload,
    ) -> GatewayResult<()> {
        Self::authorize(connection, payload)?;

        if let Err(e) = state
            .cache()
            .set_typing(payload.room_id, payload.participant_id, connection.display_name())
            .await
        {
            tracing::warn!(room_id = %payload.room_id, participant_id = %payload.participant_id, error = %e, "Failed to set typing");
            return Ok(());
        }

        Self::broadcast(state, payload.room_id, payload.participant_id).await;
        Ok(())
    }

    pub async fn stop(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: TypingPayload,
    ) -> GatewayResult<()> {
        Self::authorize(connection, payload)?;
        Self::clear(state, payload.room_id, payload.participant_id).await;
        Ok(())
    }

    /// Remove a typing indicator and tell the rest of the room
    pub(crate) async fn clear(state: &GatewayState, room_id: RoomId, participant_id: ParticipantId) {
        if let Err(e) = state.cache().clear_typing(room_id, participant_id).await {
            tracing::warn!(room_id = %room_id, participant_id = %participant_id, error = %e, "Failed to clear typing");
            return;
        }
        Self::broadcast(state, room_id, participant_id).await;
    }

    fn authorize(connection: &Connection, payload: TypingPayload) -> GatewayResult<()> {
        ensure_identity(connection, payload.participant_id)?;
        if connection.is_subscribed_to(payload.room_id) {
            Ok(())
        } else {
            Err(GatewayError::forbidden("join the room before sending typing events"))
        }
    }

    /// Send the full typer list to every room subscriber except `participant_id`
    async fn broadcast(state: &GatewayState, room_id: RoomId, participant_id: ParticipantId) {
        let typers = match state.cache().get_typers(room_id).await {
            Ok(typers) => typers,
            Err(e) => {
                tracing::warn!(room_id = %room_id, error = %e, "Failed to read typers");
                return;
            }
        };

        state
            .bridge()
            .emit(
                EventTarget::room_except(room_id, participant_id),
                &ServerEvent::typing_update(room_id, typers),
            )
            .await;
    }
}
