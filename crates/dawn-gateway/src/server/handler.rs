//! WebSocket handler
//!
//! Authenticates the handshake, then runs one connection until it closes.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Query, State, WebSocketUpgrade};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use dawn_common::{strip_bearer, AppError, Claims};
use dawn_service::ProfileService;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::interval;

use crate::connection::Connection;
use crate::handlers::{EventDispatcher, GatewayError};
use crate::protocol::{Frame, ReadyPayload, ServerEvent};
use crate::server::GatewayState;

/// Shortest idle check period
const MIN_IDLE_CHECK: Duration = Duration::from_millis(50);

/// Handshake query string
#[derive(Debug, Default, Deserialize)]
pub struct HandshakeQuery {
    pub token: Option<String>,
}

/// WebSocket gateway handler
///
/// The token comes from `Authorization: Bearer ...` or `?token=`. A missing
/// or invalid token is answered with 401 and the upgrade never happens.
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    Query(query): Query<HandshakeQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let claims = match authenticate(&state, &headers, query.token.as_deref()) {
        Ok(claims) => claims,
        Err(err) => {
            tracing::debug!(error = %err, "Handshake rejected");
            return err.into_response();
        }
    };

    let participant_id = match claims.participant_id() {
        Ok(id) => id,
        Err(e) => return GatewayError::from(e).into_response(),
    };

    let profile = match ProfileService::new(state.services())
        .get_or_create(participant_id, claims.name.as_deref())
        .await
    {
        Ok(profile) => profile,
        Err(e) => return GatewayError::from(e).into_response(),
    };

    ws.on_upgrade(move |socket| handle_socket(state, socket, participant_id, profile.nickname))
}

fn authenticate(
    state: &GatewayState,
    headers: &HeaderMap,
    query_token: Option<&str>,
) -> Result<Claims, GatewayError> {
    let header_token = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(strip_bearer);

    let token = header_token
        .or(query_token)
        .filter(|token| !token.is_empty())
        .ok_or(AppError::MissingAuth)?;

    Ok(state.jwt().verify(token)?)
}

/// Run an authenticated connection
async fn handle_socket(
    state: GatewayState,
    socket: WebSocket,
    participant_id: dawn_core::ParticipantId,
    display_name: String,
) {
    let (tx, mut rx) = mpsc::channel::<Frame>(state.realtime().outbound_buffer);

    let connection = state
        .connections()
        .add_connection(participant_id, display_name, tx);
    let connection_id = connection.connection_id().to_string();

    tracing::info!(
        connection_id = %connection_id,
        participant_id = %participant_id,
        "WebSocket connection established"
    );

    connection.send_event(&ServerEvent::Ready(ReadyPayload {
        participant_id,
        display_name: connection.display_name().to_string(),
        connection_id: connection_id.clone(),
    }));

    if let Err(e) = state.cache().set_online(&connection_id, participant_id).await {
        tracing::warn!(connection_id = %connection_id, error = %e, "Failed to record presence");
    }

    let (mut ws_sink, mut ws_stream) = socket.split();

    // Events from one connection are handled in arrival order
    let state_recv = state.clone();
    let connection_recv = connection.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    EventDispatcher::handle_text(&state_recv, &connection_recv, &text).await;
                }
                Ok(Message::Binary(_)) => {
                    connection_recv.touch();
                    let err = GatewayError::validation("binary frames are not supported");
                    connection_recv.send_event(&err.to_event(None));
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => connection_recv.touch(),
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_recv.connection_id(), "Client closed connection");
                    break;
                }
                Err(e) => {
                    tracing::debug!(
                        connection_id = %connection_recv.connection_id(),
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    let connection_id_send = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_sink.send(Message::Text(frame.to_string())).await.is_err() {
                tracing::debug!(connection_id = %connection_id_send, "Failed to write to WebSocket");
                break;
            }
        }
        let _ = ws_sink.close().await;
    });

    let idle_timeout = state.realtime().idle_timeout;
    let connection_idle = connection.clone();
    let mut idle_task = tokio::spawn(async move {
        let mut check = interval((idle_timeout / 2).max(MIN_IDLE_CHECK));
        loop {
            check.tick().await;
            let idle = connection_idle.idle_for();
            if idle > idle_timeout {
                tracing::info!(
                    connection_id = %connection_idle.connection_id(),
                    idle_ms = idle.as_millis() as u64,
                    "Closing idle connection"
                );
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
        }
        _ = &mut send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
        }
        _ = &mut idle_task => {
            tracing::debug!(connection_id = %connection_id, "Idle task ended");
        }
    }

    recv_task.abort();
    send_task.abort();
    idle_task.abort();

    cleanup_connection(&state, &connection).await;
}

/// Unregister a closed connection; nothing is broadcast
pub(crate) async fn cleanup_connection(state: &GatewayState, connection: &Arc<Connection>) {
    state.connections().remove_connection(connection.connection_id());

    if let Err(e) = state
        .cache()
        .remove_connection(connection.connection_id(), connection.participant_id())
        .await
    {
        tracing::warn!(connection_id = %connection.connection_id(), error = %e, "Failed to release presence");
    }

    tracing::info!(
        connection_id = %connection.connection_id(),
        participant_id = %connection.participant_id(),
        "WebSocket connection closed"
    );
}
