//! Cross-process event fan-out
//!
//! Delivers gateway events to this process's connections and relays them to
//! every other gateway process over the pub/sub transport.

mod dispatcher;
mod status;

pub use dispatcher::PubSubBridge;
pub use status::BridgeStatus;
