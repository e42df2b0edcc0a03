//! In-process pub/sub hub.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::broadcast;

use super::{PubSubChannel, PubSubError, PubSubEvent, PubSubResult, PubSubTransport, ReceivedMessage};

const DEFAULT_CAPACITY: usize = 1024;

struct Hub {
    available: bool,
    capacity: usize,
    channels: DashMap<String, broadcast::Sender<ReceivedMessage>>,
}

/// A pub/sub hub living in process memory
///
/// Clones share the hub, so gateways handed clones of one `MemoryPubSub`
/// behave like separate processes connected to the same broker.
#[derive(Clone)]
pub struct MemoryPubSub {
    hub: Arc<Hub>,
}

impl MemoryPubSub {
    #[must_use]
    pub fn new() -> Self {
        Self::build(true)
    }

    /// A transport whose every operation fails with [`PubSubError::Unavailable`]
    #[must_use]
    pub fn unavailable() -> Self {
        Self::build(false)
    }

    fn build(available: bool) -> Self {
        Self {
            hub: Arc::new(Hub {
                available,
                capacity: DEFAULT_CAPACITY,
                channels: DashMap::new(),
            }),
        }
    }

    fn sender(&self, channel: &PubSubChannel) -> broadcast::Sender<ReceivedMessage> {
        self.hub
            .channels
            .entry(channel.name().to_string())
            .or_insert_with(|| broadcast::channel(self.hub.capacity).0)
            .clone()
    }

    fn ensure_available(&self) -> PubSubResult<()> {
        if self.hub.available {
            Ok(())
        } else {
            Err(PubSubError::Unavailable)
        }
    }
}

impl Default for MemoryPubSub {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PubSubTransport for MemoryPubSub {
    async fn probe(&self) -> PubSubResult<()> {
        self.ensure_available()
    }

    async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> PubSubResult<u32> {
        self.ensure_available()?;
        // Same wire format as Redis so receivers exercise the parse path
        let payload = event.to_json()?;
        let receivers = self
            .sender(channel)
            .send(ReceivedMessage::from_raw(channel.name(), payload))
            .unwrap_or(0);
        Ok(u32::try_from(receivers).unwrap_or(u32::MAX))
    }

    async fn subscribe(
        &self,
        channel: &PubSubChannel,
    ) -> PubSubResult<broadcast::Receiver<ReceivedMessage>> {
        self.ensure_available()?;
        Ok(self.sender(channel).subscribe())
    }

    async fn shutdown(&self) {}
}
