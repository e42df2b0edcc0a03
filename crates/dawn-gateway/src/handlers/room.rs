//! room:join / room:leave

use std::sync::Arc;

use dawn_service::RoomService;

use super::{ensure_identity, GatewayError, GatewayResult};
use crate::connection::Connection;
use crate::protocol::{JoinRoomPayload, LeaveRoomPayload, RoomJoinedPayload, ServerEvent};
use crate::server::GatewayState;

/// Handles room subscriptions
pub struct RoomHandler;

impl RoomHandler {
    /// Subscribe the connection to a room it is a member of
    ///
    /// The acknowledgement goes to the caller only.
    pub async fn join(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: JoinRoomPayload,
    ) -> GatewayResult<()> {
        ensure_identity(connection, payload.participant_id)?;

        let rooms = RoomService::new(state.services());
        if !rooms.is_member(payload.room_id, payload.participant_id).await? {
            return Err(GatewayError::not_room_member());
        }

        state
            .connections()
            .subscribe_to_room(connection.connection_id(), payload.room_id);

        // A failed read marker never fails the join
        if let Err(e) = rooms.mark_read(payload.room_id, payload.participant_id).await {
            tracing::warn!(room_id = %payload.room_id, participant_id = %payload.participant_id, error = %e, "Failed to mark room read");
        }

        connection.send_event(&ServerEvent::RoomJoined(RoomJoinedPayload {
            room_id: payload.room_id,
        }));

        tracing::debug!(
            connection_id = %connection.connection_id(),
            room_id = %payload.room_id,
            "Joined room"
        );
        Ok(())
    }

    /// Unsubscribe the connection from a room; idempotent
    pub fn leave(state: &GatewayState, connection: &Arc<Connection>, payload: LeaveRoomPayload) {
        state
            .connections()
            .unsubscribe_from_room(connection.connection_id(), payload.room_id);

        tracing::debug!(
            connection_id = %connection.connection_id(),
            room_id = %payload.room_id,
            "Left room"
        );
    }
}
