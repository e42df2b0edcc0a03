//! Connection manager
//!
//! Indexes open connections by id, participant and room using `DashMap`.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use dawn_cache::EventTarget;
use dawn_core::{ParticipantId, RoomId};
use tokio::sync::mpsc;

use super::Connection;
use crate::protocol::Frame;

/// Manages all active WebSocket connections of this process
pub struct ConnectionManager {
    /// Active connections by connection ID
    connections: DashMap<String, Arc<Connection>>,

    /// Participant ID to connection IDs
    participant_connections: DashMap<ParticipantId, HashSet<String>>,

    /// Room ID to subscribed connection IDs
    room_connections: DashMap<RoomId, HashSet<String>>,
}

impl ConnectionManager {
    /// Create a new connection manager
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
            participant_connections: DashMap::new(),
            room_connections: DashMap::new(),
        }
    }

    /// Create a new connection manager wrapped in Arc
    #[must_use]
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Register an authenticated connection
    pub fn add_connection(
        &self,
        participant_id: ParticipantId,
        display_name: impl Into<String>,
        sender: mpsc::Sender<Frame>,
    ) -> Arc<Connection> {
        let connection = Connection::new(participant_id, display_name, sender);
        let connection_id = connection.connection_id().to_string();

        self.connections.insert(connection_id.clone(), connection.clone());
        self.participant_connections
            .entry(participant_id)
            .or_default()
            .insert(connection_id.clone());

        tracing::debug!(connection_id = %connection_id, participant_id = %participant_id, "Connection added");
        connection
    }

    /// Remove a connection from every index
    pub fn remove_connection(&self, connection_id: &str) {
        let Some((_, connection)) = self.connections.remove(connection_id) else {
            return;
        };

        self.participant_connections
            .remove_if_mut(&connection.participant_id(), |_, ids| {
                ids.remove(connection_id);
                ids.is_empty()
            });

        for room_id in connection.rooms() {
            self.room_connections.remove_if_mut(&room_id, |_, ids| {
                ids.remove(connection_id);
                ids.is_empty()
            });
        }

        tracing::debug!(connection_id = %connection_id, "Connection removed");
    }

    /// Get a connection by ID
    pub fn get_connection(&self, connection_id: &str) -> Option<Arc<Connection>> {
        self.connections.get(connection_id).map(|r| r.clone())
    }

    /// Subscribe a connection to a room's events; idempotent
    pub fn subscribe_to_room(&self, connection_id: &str, room_id: RoomId) -> bool {
        let Some(connection) = self.get_connection(connection_id) else {
            return false;
        };

        connection.subscribe(room_id);
        self.room_connections
            .entry(room_id)
            .or_default()
            .insert(connection_id.to_string());

        tracing::trace!(connection_id = %connection_id, room_id = %room_id, "Subscribed to room");
        true
    }

    /// Unsubscribe a connection from a room; idempotent
    pub fn unsubscribe_from_room(&self, connection_id: &str, room_id: RoomId) -> bool {
        let Some(connection) = self.get_connection(connection_id) else {
            return false;
        };

        connection.unsubscribe(room_id);
        self.room_connections.remove_if_mut(&room_id, |_, ids| {
            ids.remove(connection_id);
            ids.is_empty()
        });

        tracing::trace!(connection_id = %connection_id, room_id = %room_id, "Unsubscribed from room");
        true
    }

    /// All connections of a participant
    pub fn get_participant_connections(&self, participant_id: ParticipantId) -> Vec<Arc<Connection>> {
        self.collect(self.participant_connections.get(&participant_id).as_deref())
    }

    /// All connections subscribed to a room
    pub fn get_room_connections(&self, room_id: RoomId) -> Vec<Arc<Connection>> {
        self.collect(self.room_connections.get(&room_id).as_deref())
    }

    fn collect(&self, ids: Option<&HashSet<String>>) -> Vec<Arc<Connection>> {
        ids.map(|ids| {
            ids.iter()
                .filter_map(|id| self.connections.get(id).map(|c| c.clone()))
                .collect()
        })
        .unwrap_or_default()
    }

    /// Send a frame to every subscriber of a room, optionally skipping one participant
    pub fn send_to_room(&self, room_id: RoomId, frame: &Frame, exclude: Option<ParticipantId>) -> usize {
        let sent = self
            .get_room_connections(room_id)
            .into_iter()
            .filter(|conn| Some(conn.participant_id()) != exclude)
            .filter(|conn| conn.try_send(frame.clone()))
            .count();

        tracing::trace!(room_id = %room_id, sent, "Frame sent to room");
        sent
    }

    /// Send a frame to every connection
    pub fn broadcast(&self, frame: &Frame) -> usize {
        // Snapshot first so no shard lock is held while queueing
        let connections: Vec<Arc<Connection>> =
            self.connections.iter().map(|r| r.value().clone()).collect();

        let sent = connections
            .into_iter()
            .filter(|conn| conn.try_send(frame.clone()))
            .count();

        tracing::trace!(sent, "Frame broadcast to all connections");
        sent
    }

    /// Deliver a frame to the local connections a target names
    pub fn deliver(&self, target: EventTarget, frame: &Frame) -> usize {
        match target {
            EventTarget::Room { room_id, exclude } => self.send_to_room(room_id, frame, exclude),
            EventTarget::All => self.broadcast(frame),
        }
    }

    /// Get the total number of active connections
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Get the number of distinct connected participants
    pub fn participant_count(&self) -> usize {
        self.participant_connections.len()
    }

    /// Get the number of rooms with at least one subscriber
    pub fn room_count(&self) -> usize {
        self.room_connections.len()
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connections", &self.connections.len())
            .field("participants", &self.participant_connections.len())
            .field("rooms", &self.room_connections.len())
            .finish()
    }
}
