//! Pub/Sub channel definitions.

/// Channel every gateway process shares for chat events
pub const DEFAULT_EVENTS_CHANNEL: &str = "dawn:chat:events";

/// A named pub/sub channel
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PubSubChannel(String);

impl PubSubChannel {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the channel name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl Default for PubSubChannel {
    fn default() -> Self {
        Self::new(DEFAULT_EVENTS_CHANNEL)
    }
}

impl std::fmt::Display for PubSubChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
