//! Individual WebSocket connection
//!
//! Identity is fixed at handshake; only room subscriptions and the idle timer
//! change afterwards.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dawn_core::{ParticipantId, RoomId};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::{Frame, ServerEvent};

/// A single WebSocket connection
pub struct Connection {
    /// Unique connection ID
    connection_id: String,

    participant_id: ParticipantId,

    /// Nickname used in typing indicators
    display_name: String,

    /// Outbound queue drained by the socket's send task
    sender: mpsc::Sender<Frame>,

    /// Rooms this connection receives events for
    rooms: RwLock<HashSet<RoomId>>,

    /// Last frame received from the client
    last_activity: Mutex<Instant>,
}

impl Connection {
    /// Create a new connection with a fresh id
    pub fn new(
        participant_id: ParticipantId,
        display_name: impl Into<String>,
        sender: mpsc::Sender<Frame>,
    ) -> Arc<Self> {
        Arc::new(Self {
            connection_id: Self::generate_id(),
            participant_id,
            display_name: display_name.into(),
            sender,
            rooms: RwLock::new(HashSet::new()),
            last_activity: Mutex::new(Instant::now()),
        })
    }

    /// Generate a new connection ID
    pub fn generate_id() -> String {
        Uuid::new_v4().simple().to_string()
    }

    pub fn connection_id(&self) -> &str {
        &self.connection_id
    }

    pub fn participant_id(&self) -> ParticipantId {
        self.participant_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Record client activity
    pub fn touch(&self) {
        *self.last_activity.lock() = Instant::now();
    }

    /// Time since the client last sent a frame
    pub fn idle_for(&self) -> Duration {
        self.last_activity.lock().elapsed()
    }

    pub(crate) fn subscribe(&self, room_id: RoomId) -> bool {
        self.rooms.write().insert(room_id)
    }

    pub(crate) fn unsubscribe(&self, room_id: RoomId) -> bool {
        self.rooms.write().remove(&room_id)
    }

    /// Check if subscribed to a room
    pub fn is_subscribed_to(&self, room_id: RoomId) -> bool {
        self.rooms.read().contains(&room_id)
    }

    /// Rooms this connection is subscribed to
    pub fn rooms(&self) -> Vec<RoomId> {
        self.rooms.read().iter().copied().collect()
    }

    /// Queue a frame without waiting
    ///
    /// Returns false when the queue is full or the socket is gone; a full
    /// queue drops the frame rather than stalling fan-out to other connections.
    pub fn try_send(&self, frame: Frame) -> bool {
        match self.sender.try_send(frame) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(
                    connection_id = %self.connection_id,
                    participant_id = %self.participant_id,
                    "Outbound queue full, dropping frame"
                );
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }

    /// Serialize and queue an event for this connection only
    pub fn send_event(&self, event: &ServerEvent) -> bool {
        match event.to_frame() {
            Ok(frame) => self.try_send(frame),
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
                false
            }
        }
    }

    /// Check if the outbound channel is closed
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("connection_id", &self.connection_id)
            .field("participant_id", &self.participant_id)
            .field("rooms", &self.rooms.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RoomJoinedPayload;

    #[test]
    fn test_connection_creation() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new(ParticipantId::new(7), "Ash", tx);

        assert_eq!(conn.participant_id(), ParticipantId::new(7));
        assert_eq!(conn.display_name(), "Ash");
        assert_eq!(conn.connection_id().len(), 32);
        assert!(conn.rooms().is_empty());
    }

    #[test]
    fn test_connection_rooms() {
        let (tx, _rx) = mpsc::channel(10);
        let conn = Connection::new(ParticipantId::new(1), "Ash", tx);

        assert!(conn.subscribe(RoomId::new(1)));
        assert!(!conn.subscribe(RoomId::new(1)));
        assert!(conn.subscribe(RoomId::new(2)));
        assert!(conn.is_subscribed_to(RoomId::new(1)));

        assert!(conn.unsubscribe(RoomId::new(1)));
        assert!(!conn.unsubscribe(RoomId::new(1)));
        assert!(!conn.is_subscribed_to(RoomId::new(1)));
        assert_eq!(conn.rooms(), vec![RoomId::new(2)]);
    }

    #[tokio::test]
    async fn test_send_event_and_full_queue() {
        let (tx, mut rx) = mpsc::channel(1);
        let conn = Connection::new(ParticipantId::new(1), "Ash", tx);
        let event = ServerEvent::RoomJoined(RoomJoinedPayload { room_id: RoomId::new(5) });

        assert!(conn.send_event(&event));
        assert!(!conn.send_event(&event));

        let frame = rx.recv().await.unwrap();
        assert_eq!(ServerEvent::from_json(&frame).unwrap(), event);

        drop(rx);
        assert!(conn.is_closed());
        assert!(!conn.send_event(&event));
    }

    #[test]
    fn test_idle_timer() {
        let (tx, _rx) = mpsc::channel(1);
        let conn = Connection::new(ParticipantId::new(1), "Ash", tx);
        std::thread::sleep(Duration::from_millis(20));
        assert!(conn.idle_for() >= Duration::from_millis(20));
        conn.touch();
        assert!(conn.idle_for() < Duration::from_millis(20));
    }
}
