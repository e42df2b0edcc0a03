//! Redis Pub/Sub publisher.

use redis::AsyncCommands;

use super::{PubSubChannel, PubSubEvent, PubSubResult};
use crate::pool::RedisPool;

/// Redis Pub/Sub publisher
#[derive(Clone)]
pub struct Publisher {
    pool: RedisPool,
}

impl Publisher {
    /// Create a new publisher
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self { pool }
    }

    /// Publish an event to a channel
    pub async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> PubSubResult<u32> {
        let payload = event.to_json()?;
        let mut conn = self.pool.get().await?;

        let receivers: u32 = conn.publish(channel.name(), &payload).await?;

        tracing::debug!(
            channel = %channel,
            event_type = %event.event_type,
            receivers = receivers,
            "Published event"
        );

        Ok(receivers)
    }
}
