//! Backend selection
//!
//! PostgreSQL when a database is configured, otherwise the in-memory store.
//! Redis when configured and reachable, otherwise the in-memory cache with the
//! pub/sub bridge degraded to local delivery.

use std::sync::Arc;

use dawn_cache::{
    MemoryPubSub, MemoryStateCache, PubSubChannel, PubSubTransport, RealtimeStateCache, RedisPool,
    RedisPubSub, RedisStateCache,
};
use dawn_common::{AppConfig, AppError, JwtService, RealtimeConfig};
use dawn_db::{MemoryChatStore, PoolConfig};
use dawn_service::ServiceContext;

use super::GatewayState;
use crate::bridge::PubSubBridge;
use crate::connection::ConnectionManager;

/// Store, cache and transport chosen for this process
pub struct Backends {
    pub services: ServiceContext,
    pub cache: Arc<dyn RealtimeStateCache>,
    pub transport: Arc<dyn PubSubTransport>,
}

impl Backends {
    /// Connect to the configured backends
    ///
    /// # Errors
    /// Fails if a configured database cannot be reached or migrated. An
    /// unreachable Redis is not an error.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let services = match &config.database {
            Some(database) => {
                tracing::info!("Connecting to PostgreSQL...");
                let pool = dawn_db::create_pool(&PoolConfig::from(database))
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                dawn_db::run_migrations(&pool)
                    .await
                    .map_err(|e| AppError::Database(e.to_string()))?;
                tracing::info!("PostgreSQL connection established");
                ServiceContext::postgres(pool)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, messages are kept in memory only");
                ServiceContext::in_memory(Arc::new(MemoryChatStore::new()))
            }
        };

        let realtime = &config.realtime;
        let (cache, transport): (Arc<dyn RealtimeStateCache>, Arc<dyn PubSubTransport>) =
            match connect_redis(config).await {
                Some(pool) => (
                    Arc::new(RedisStateCache::new(
                        pool.clone(),
                        realtime.typing_ttl,
                        realtime.presence_ttl,
                    )),
                    Arc::new(RedisPubSub::new(pool)),
                ),
                None => (
                    Arc::new(MemoryStateCache::new(realtime.typing_ttl, realtime.presence_ttl)),
                    Arc::new(MemoryPubSub::unavailable()),
                ),
            };

        Ok(Self {
            services,
            cache,
            transport,
        })
    }

    /// Fully in-process backends
    ///
    /// Processes sharing one `MemoryPubSub` hub see each other's events.
    pub fn in_memory(
        store: Arc<MemoryChatStore>,
        transport: MemoryPubSub,
        realtime: &RealtimeConfig,
    ) -> Self {
        Self {
            services: ServiceContext::in_memory(store),
            cache: Arc::new(MemoryStateCache::new(realtime.typing_ttl, realtime.presence_ttl)),
            transport: Arc::new(transport),
        }
    }

    /// Start the bridge and assemble the gateway state
    pub async fn into_state(self, jwt: JwtService, realtime: RealtimeConfig) -> GatewayState {
        let connections = ConnectionManager::new_shared();
        let bridge = PubSubBridge::start(
            self.transport,
            PubSubChannel::new(realtime.pubsub_channel.clone()),
            connections.clone(),
        )
        .await;

        GatewayState::new(self.services, connections, bridge, self.cache, jwt, realtime)
    }
}

async fn connect_redis(config: &AppConfig) -> Option<RedisPool> {
    let Some(redis) = &config.redis else {
        tracing::warn!("REDIS_URL not set, typing and presence are process-local");
        return None;
    };

    tracing::info!("Connecting to Redis...");
    let pool = match RedisPool::from_config(redis) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(error = %e, "Invalid Redis configuration, using in-memory state");
            return None;
        }
    };

    match pool.health_check().await {
        Ok(()) => {
            tracing::info!("Redis connection established");
            Some(pool)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Redis unreachable, using in-memory state");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::BridgeStatus;

    #[tokio::test]
    async fn test_unconfigured_backends_run_degraded() {
        let config =
            AppConfig::from_lookup(|key| (key == "JWT_SECRET").then(|| "s3cret".to_string())).unwrap();

        let backends = Backends::from_config(&config).await.unwrap();
        let state = backends
            .into_state(JwtService::new(&config.jwt.secret), config.realtime.clone())
            .await;

        assert_eq!(state.bridge().status(), BridgeStatus::Degraded);
        assert_eq!(state.connections().connection_count(), 0);
    }
}
