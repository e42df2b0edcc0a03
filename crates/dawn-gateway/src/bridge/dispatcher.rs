//! Pub/sub bridge
//!
//! Local delivery always happens first; the envelope is then published so
//! other processes can deliver to their own subscribers. Envelopes this
//! process published come back on the shared channel and are skipped.

use std::sync::Arc;

use dawn_cache::{EventTarget, PubSubChannel, PubSubEvent, PubSubResult, PubSubTransport, ReceivedMessage};
use parking_lot::Mutex;
use serde::Deserialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::status::StatusCell;
use super::BridgeStatus;
use crate::connection::ConnectionManager;
use crate::handlers::GatewayError;
use crate::protocol::{Frame, ServerEvent};

/// Fans gateway events out locally and across processes
pub struct PubSubBridge {
    /// Identifies this process's envelopes
    node_id: Uuid,
    channel: PubSubChannel,
    transport: Arc<dyn PubSubTransport>,
    connections: Arc<ConnectionManager>,
    status: Arc<StatusCell>,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl PubSubBridge {
    /// Probe the transport and start listening on `channel`
    ///
    /// An unreachable transport leaves the bridge `Degraded`: events are then
    /// delivered to this process's connections only.
    pub async fn start(
        transport: Arc<dyn PubSubTransport>,
        channel: PubSubChannel,
        connections: Arc<ConnectionManager>,
    ) -> Arc<Self> {
        let bridge = Self {
            node_id: Uuid::new_v4(),
            channel,
            transport,
            connections,
            status: Arc::new(StatusCell::new(BridgeStatus::Degraded)),
            listener: Mutex::new(None),
        };

        match bridge.connect().await {
            Ok(receiver) => {
                let handle = tokio::spawn(listen(
                    bridge.node_id,
                    bridge.connections.clone(),
                    bridge.status.clone(),
                    receiver,
                ));
                *bridge.listener.lock() = Some(handle);
                bridge.status.set(BridgeStatus::Active);

                tracing::info!(node_id = %bridge.node_id, channel = %bridge.channel, "Pub/sub bridge active");
            }
            Err(e) => {
                let err = GatewayError::Transport(e.to_string());
                tracing::warn!(error = %err, "Pub/sub transport unavailable, delivering to local connections only");
            }
        }

        Arc::new(bridge)
    }

    async fn connect(&self) -> PubSubResult<broadcast::Receiver<ReceivedMessage>> {
        self.transport.probe().await?;
        self.transport.subscribe(&self.channel).await
    }

    /// Deliver an event locally, then publish it for other processes
    ///
    /// Returns the number of local connections the event was queued for.
    /// Publish failures are logged and never reach the caller.
    pub async fn emit(&self, target: EventTarget, event: &ServerEvent) -> usize {
        let data = match serde_json::to_value(event) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(event = event.name(), error = %e, "Failed to serialize event");
                return 0;
            }
        };

        let frame = Frame::from(data.to_string());
        let delivered = self.connections.deliver(target, &frame);

        if self.status() == BridgeStatus::Active {
            let envelope = PubSubEvent::new(self.node_id, target, event.name(), data);
            if let Err(e) = self.transport.publish(&self.channel, &envelope).await {
                let err = GatewayError::Transport(e.to_string());
                tracing::warn!(event = event.name(), error = %err, "Failed to publish event");
            }
        }

        tracing::trace!(event = event.name(), delivered, "Event emitted");
        delivered
    }

    /// Current bridge state
    pub fn status(&self) -> BridgeStatus {
        self.status.get()
    }

    /// This process's node id
    pub fn node_id(&self) -> Uuid {
        self.node_id
    }

    /// Stop listening and release the transport
    pub async fn shutdown(&self) {
        self.status.set(BridgeStatus::Stopped);
        if let Some(handle) = self.listener.lock().take() {
            handle.abort();
        }
        self.transport.shutdown().await;
        tracing::info!(node_id = %self.node_id, "Pub/sub bridge stopped");
    }
}

impl std::fmt::Debug for PubSubBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PubSubBridge")
            .field("node_id", &self.node_id)
            .field("channel", &self.channel)
            .field("status", &self.status())
            .finish()
    }
}

async fn listen(
    node_id: Uuid,
    connections: Arc<ConnectionManager>,
    status: Arc<StatusCell>,
    mut receiver: broadcast::Receiver<ReceivedMessage>,
) {
    loop {
        match receiver.recv().await {
            Ok(message) => {
                relay(node_id, &connections, message);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(lagged = n, "Pub/sub bridge lagged behind");
            }
            Err(broadcast::error::RecvError::Closed) => {
                if status.get() == BridgeStatus::Active {
                    status.set(BridgeStatus::Degraded);
                }
                tracing::warn!("Pub/sub stream closed, delivering to local connections only");
                break;
            }
        }
    }
}

/// Deliver an envelope from another process to local connections
fn relay(node_id: Uuid, connections: &ConnectionManager, message: ReceivedMessage) -> usize {
    let Some(envelope) = message.event else {
        tracing::warn!(channel = %message.channel, "Dropping malformed pub/sub payload");
        return 0;
    };

    if envelope.origin == node_id {
        return 0;
    }

    let frame = match ServerEvent::deserialize(&envelope.data).and_then(|event| event.to_frame()) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(event_type = %envelope.event_type, error = %e, "Dropping undecodable bridged event");
            return 0;
        }
    };

    let delivered = connections.deliver(envelope.target, &frame);
    tracing::trace!(event_type = %envelope.event_type, origin = %envelope.origin, delivered, "Bridged event relayed");
    delivered
}
