//! In-process gateway harness for unit tests

use std::sync::Arc;
use std::time::Duration;

use dawn_cache::MemoryPubSub;
use dawn_common::{JwtService, RealtimeConfig};
use dawn_core::{ParticipantId, RoomId, RoomType};
use dawn_db::MemoryChatStore;
use dawn_service::{CreateRoomRequest, RoomService};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::connection::Connection;
use crate::handlers::EventDispatcher;
use crate::protocol::{Frame, ServerEvent};
use crate::server::{Backends, GatewayState};

pub const SECRET: &str = "test-secret";

pub fn realtime() -> RealtimeConfig {
    RealtimeConfig {
        typing_ttl: Duration::from_millis(150),
        ..RealtimeConfig::default()
    }
}

/// One gateway process over a shared store and pub/sub hub
pub async fn process(store: Arc<MemoryChatStore>, hub: MemoryPubSub) -> GatewayState {
    let realtime = realtime();
    Backends::in_memory(store, hub, &realtime)
        .into_state(JwtService::new(SECRET), realtime)
        .await
}

/// A single process with its own store and hub
pub async fn gateway() -> GatewayState {
    process(Arc::new(MemoryChatStore::new()), MemoryPubSub::new()).await
}

pub async fn room_with(state: &GatewayState, members: &[i64]) -> RoomId {
    RoomService::new(state.services())
        .admin_create_room(CreateRoomRequest {
            name: "Night Owls".to_string(),
            room_type: RoomType::Group,
            member_ids: members.iter().copied().map(ParticipantId::new).collect(),
        })
        .await
        .unwrap()
        .id
}

/// A registered connection with its outbound queue
pub struct Client {
    pub connection: Arc<Connection>,
    rx: mpsc::Receiver<Frame>,
}

impl Client {
    pub fn connect(state: &GatewayState, participant_id: i64) -> Self {
        let (tx, rx) = mpsc::channel(64);
        let connection = state.connections().add_connection(
            ParticipantId::new(participant_id),
            format!("Trainer {participant_id}"),
            tx,
        );
        Self { connection, rx }
    }

    pub async fn send(&self, state: &GatewayState, frame: Value) {
        EventDispatcher::handle_text(state, &self.connection, &frame.to_string()).await;
    }

    /// Everything queued so far
    pub fn drain(&mut self) -> Vec<ServerEvent> {
        let mut events = Vec::new();
        while let Ok(frame) = self.rx.try_recv() {
            events.push(ServerEvent::from_json(&frame).unwrap());
        }
        events
    }

    /// Next event, waiting for cross-process delivery
    pub async fn next(&mut self) -> Option<ServerEvent> {
        tokio::time::timeout(Duration::from_secs(1), self.rx.recv())
            .await
            .ok()
            .flatten()
            .map(|frame| ServerEvent::from_json(&frame).unwrap())
    }
}

pub fn messages(events: &[ServerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::MessageNew(message) => message.content.clone(),
            _ => None,
        })
        .collect()
}

pub fn error_codes(events: &[ServerEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|event| match event {
            ServerEvent::Error(payload) => Some(payload.code.clone()),
            _ => None,
        })
        .collect()
}
