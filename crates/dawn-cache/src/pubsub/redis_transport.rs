//! Redis implementation of [`PubSubTransport`].

use async_trait::async_trait;
use tokio::sync::{broadcast, OnceCell};

use super::{
    PubSubChannel, PubSubEvent, PubSubResult, PubSubTransport, Publisher, ReceivedMessage,
    Subscriber, SubscriberBuilder,
};
use crate::pool::RedisPool;

/// Pub/sub over Redis: pooled connections publish, one dedicated connection listens
pub struct RedisPubSub {
    pool: RedisPool,
    publisher: Publisher,
    subscriber: OnceCell<Subscriber>,
}

impl RedisPubSub {
    #[must_use]
    pub fn new(pool: RedisPool) -> Self {
        Self {
            publisher: Publisher::new(pool.clone()),
            pool,
            subscriber: OnceCell::new(),
        }
    }
}

#[async_trait]
impl PubSubTransport for RedisPubSub {
    async fn probe(&self) -> PubSubResult<()> {
        self.pool.health_check().await?;
        Ok(())
    }

    async fn publish(&self, channel: &PubSubChannel, event: &PubSubEvent) -> PubSubResult<u32> {
        self.publisher.publish(channel, event).await
    }

    async fn subscribe(
        &self,
        channel: &PubSubChannel,
    ) -> PubSubResult<broadcast::Receiver<ReceivedMessage>> {
        // The listener starts on first use so an unreachable Redis never spawns it
        let subscriber = self
            .subscriber
            .get_or_init(|| async {
                SubscriberBuilder::new()
                    .redis_url(self.pool.url())
                    .build()
            })
            .await;

        let receiver = subscriber.receiver();
        subscriber.subscribe(std::slice::from_ref(channel)).await?;
        Ok(receiver)
    }

    async fn shutdown(&self) {
        if let Some(subscriber) = self.subscriber.get() {
            if let Err(e) = subscriber.shutdown().await {
                tracing::debug!(error = %e, "Subscriber already stopped");
            }
        }
    }
}
