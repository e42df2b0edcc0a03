//! Bridge health state

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use serde::Serialize;

/// Whether events reach other processes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeStatus {
    /// Publishing and listening on the shared channel
    Active,
    /// Transport unavailable at startup; delivery is local only
    Degraded,
    /// Shut down
    Stopped,
}

impl BridgeStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Degraded => "degraded",
            Self::Stopped => "stopped",
        }
    }

    const fn to_u8(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Degraded => 1,
            Self::Stopped => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Active,
            1 => Self::Degraded,
            _ => Self::Stopped,
        }
    }
}

impl fmt::Display for BridgeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lock-free cell holding a [`BridgeStatus`]
#[derive(Debug)]
pub(crate) struct StatusCell(AtomicU8);

impl StatusCell {
    pub(crate) fn new(status: BridgeStatus) -> Self {
        Self(AtomicU8::new(status.to_u8()))
    }

    pub(crate) fn get(&self) -> BridgeStatus {
        BridgeStatus::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, status: BridgeStatus) {
        self.0.store(status.to_u8(), Ordering::Release);
    }
}
