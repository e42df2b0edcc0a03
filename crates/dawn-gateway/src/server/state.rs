//! Gateway state
//!
//! Everything a connection handler needs, built once at startup and passed to
//! the router.

use std::sync::Arc;

use dawn_cache::RealtimeStateCache;
use dawn_common::{JwtService, RealtimeConfig};
use dawn_service::ServiceContext;

use crate::bridge::PubSubBridge;
use crate::connection::ConnectionManager;

/// Gateway application state
#[derive(Clone)]
pub struct GatewayState {
    services: Arc<ServiceContext>,
    connections: Arc<ConnectionManager>,
    bridge: Arc<PubSubBridge>,
    cache: Arc<dyn RealtimeStateCache>,
    jwt: Arc<JwtService>,
    realtime: Arc<RealtimeConfig>,
}

impl GatewayState {
    /// Create a new gateway state
    pub fn new(
        services: ServiceContext,
        connections: Arc<ConnectionManager>,
        bridge: Arc<PubSubBridge>,
        cache: Arc<dyn RealtimeStateCache>,
        jwt: JwtService,
        realtime: RealtimeConfig,
    ) -> Self {
        Self {
            services: Arc::new(services),
            connections,
            bridge,
            cache,
            jwt: Arc::new(jwt),
            realtime: Arc::new(realtime),
        }
    }

    /// Chat services over the message store
    pub fn services(&self) -> &ServiceContext {
        &self.services
    }

    /// This process's connections
    pub fn connections(&self) -> &ConnectionManager {
        &self.connections
    }

    /// Cross-process fan-out
    pub fn bridge(&self) -> &PubSubBridge {
        &self.bridge
    }

    /// Typing and presence cache
    pub fn cache(&self) -> &dyn RealtimeStateCache {
        self.cache.as_ref()
    }

    /// Handshake token verifier
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Realtime timings and limits
    pub fn realtime(&self) -> &RealtimeConfig {
        &self.realtime
    }
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("connections", &self.connections)
            .field("bridge", &self.bridge)
            .field("realtime", &self.realtime)
            .finish_non_exhaustive()
    }
}
