//! presence:heartbeat

use std::sync::Arc;

use super::{ensure_identity, GatewayResult};
use crate::connection::Connection;
use crate::protocol::HeartbeatPayload;
use crate::server::GatewayState;

/// Handles presence heartbeats
pub struct PresenceHandler;

impl PresenceHandler {
    /// Refresh presence expiry; nothing is broadcast
    ///
    /// The idle timer was already reset when the frame arrived.
    pub async fn heartbeat(
        state: &GatewayState,
        connection: &Arc<Connection>,
        payload: HeartbeatPayload,
    ) -> GatewayResult<()> {
        ensure_identity(connection, payload.participant_id)?;

        if let Err(e) = state.cache().heartbeat(payload.participant_id).await {
            tracing::warn!(participant_id = %payload.participant_id, error = %e, "Failed to record heartbeat");
        }

        tracing::trace!(connection_id = %connection.connection_id(), "Heartbeat received");
        Ok(())
    }
}
