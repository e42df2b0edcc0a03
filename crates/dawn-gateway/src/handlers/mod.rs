//! Client event handlers
//!
//! Each frame is parsed into a [`ClientEvent`], routed to its handler, and any
//! failure is reported to the sending connection only.

mod error;
mod message;
mod presence;
mod room;
mod typing;

pub use error::{
    GatewayError, GatewayResult, AUTHENTICATION_FAILED, FORBIDDEN, NOT_ROOM_MEMBER,
    PERSISTENCE_ERROR, UNKNOWN_MESSAGE, VALIDATION_ERROR,
};
pub use message::MessageHandler;
pub use presence::PresenceHandler;
pub use room::RoomHandler;
pub use typing::TypingHandler;

use std::sync::Arc;

use dawn_core::ParticipantId;

use crate::connection::Connection;
use crate::protocol::ClientEvent;
use crate::server::GatewayState;

/// Routes client events to their handlers
pub struct EventDispatcher;

impl EventDispatcher {
    /// Handle one text frame from a connection
    ///
    /// Events on one connection are handled one at a time, in arrival order.
    pub async fn handle_text(state: &GatewayState, connection: &Arc<Connection>, text: &str) {
        connection.touch();

        let (event_name, result) = match ClientEvent::parse(text) {
            Ok(event) => (Some(event.name()), Self::dispatch(state, connection, event).await),
            Err(e) => (None, Err(e)),
        };

        if let Err(err) = result {
            report(connection, event_name, &err);
        }
    }

    /// Route a parsed event to its handler
    pub async fn dispatch(
        state: &GatewayState,
        connection: &Arc<Connection>,
        event: ClientEvent,
    ) -> GatewayResult<()> {
        tracing::trace!(
            connection_id = %connection.connection_id(),
            event = event.name(),
            "Received event"
        );

        match event {
            ClientEvent::JoinRoom(payload) => RoomHandler::join(state, connection, payload).await,
            ClientEvent::LeaveRoom(payload) => {
                RoomHandler::leave(state, connection, payload);
                Ok(())
            }
            ClientEvent::SendMessage(payload) => MessageHandler::send(state, connection, payload).await,
            ClientEvent::TypingStart(payload) => TypingHandler::start(state, connection, payload).await,
            ClientEvent::TypingStop(payload) => TypingHandler::stop(state, connection, payload).await,
            ClientEvent::Heartbeat(payload) => PresenceHandler::heartbeat(state, connection, payload).await,
        }
    }
}

/// Send an error to the failing connection; never broadcast
fn report(connection: &Connection, event: Option<&str>, err: &GatewayError) {
    match err {
        GatewayError::Persistence(_) | GatewayError::Transport(_) => tracing::warn!(
            connection_id = %connection.connection_id(),
            participant_id = %connection.participant_id(),
            event = ?event,
            error = %err,
            "Event failed"
        ),
        _ => tracing::debug!(
            connection_id = %connection.connection_id(),
            participant_id = %connection.participant_id(),
            event = ?event,
            code = err.code(),
            error = %err,
            "Event rejected"
        ),
    }

    if err.is_client_visible() {
        connection.send_event(&err.to_event(event));
    }
}

/// The payload must name the participant the connection authenticated as
pub(crate) fn ensure_identity(connection: &Connection, claimed: ParticipantId) -> GatewayResult<()> {
    if connection.participant_id() == claimed {
        Ok(())
    } else {
        Err(GatewayError::forbidden(
            "participant_id does not match the authenticated participant",
        ))
    }
}
