//! Background workers
//!
//! Periodic typing sweep and last-seen flush. Both log failures and keep
//! running; both are aborted on shutdown.

use std::time::Duration;

use dawn_service::ProfileService;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::server::GatewayState;

/// Handles to the running workers
pub struct Workers {
    handles: Vec<JoinHandle<()>>,
}

impl Workers {
    /// Spawn the typing sweep and the last-seen flush
    pub fn spawn(state: &GatewayState) -> Self {
        let realtime = state.realtime();
        Self {
            handles: vec![
                spawn_typing_sweep(state.clone(), realtime.typing_sweep_interval),
                spawn_last_seen_flush(state.clone(), realtime.flush_interval),
            ],
        }
    }

    /// Stop the workers, then flush whatever last-seen timestamps remain
    pub async fn shutdown(self, state: &GatewayState) {
        for handle in &self.handles {
            handle.abort();
        }

        let flushed = flush_last_seen(state).await;
        tracing::info!(flushed, "Background workers stopped");
    }
}

fn spawn_typing_sweep(state: GatewayState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // First tick completes immediately
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match state.cache().cleanup_stale_typing().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Swept stale typing indicators"),
                Err(e) => tracing::warn!(error = %e, "Typing sweep failed"),
            }
        }
    })
}

fn spawn_last_seen_flush(state: GatewayState, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;
            flush_last_seen(&state).await;
        }
    })
}

/// Drain buffered last-seen timestamps into chat profiles
///
/// Returns how many profiles were updated.
pub async fn flush_last_seen(state: &GatewayState) -> usize {
    let entries = match state.cache().take_last_seen().await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to drain last-seen buffer");
            return 0;
        }
    };

    let profiles = ProfileService::new(state.services());
    let mut flushed = 0;
    for (participant_id, at) in entries {
        // Profiles are created at handshake; a missing one is skipped by the store
        match profiles.record_last_seen(participant_id, at).await {
            Ok(()) => flushed += 1,
            Err(e) => {
                tracing::warn!(participant_id = %participant_id, error = %e, "Failed to record last seen");
            }
        }
    }

    if flushed > 0 {
        tracing::debug!(flushed, "Flushed last-seen timestamps");
    }
    flushed
}

#[cfg(test)]
mod tests {
    use super::*;
    use dawn_core::ParticipantId;

    use crate::testing::gateway;

    #[tokio::test]
    async fn test_flush_moves_heartbeats_into_profiles() {
        let state = gateway().await;
        let p1 = ParticipantId::new(1);
        let profiles = ProfileService::new(state.services());
        profiles.get_or_create(p1, Some("Ash")).await.unwrap();

        state.cache().heartbeat(p1).await.unwrap();

        assert_eq!(flush_last_seen(&state).await, 1);
        let profile = profiles.get(p1).await.unwrap().unwrap();
        assert!(profile.last_seen_at.is_some());

        // Buffer was drained
        assert_eq!(flush_last_seen(&state).await, 0);
    }

    #[tokio::test]
    async fn test_shutdown_flushes_remaining_timestamps() {
        let state = gateway().await;
        let p1 = ParticipantId::new(1);
        let profiles = ProfileService::new(state.services());
        profiles.get_or_create(p1, None).await.unwrap();

        let workers = Workers::spawn(&state);
        state.cache().heartbeat(p1).await.unwrap();
        workers.shutdown(&state).await;

        let profile = profiles.get(p1).await.unwrap().unwrap();
        assert!(profile.last_seen_at.is_some());
    }
}
