//! Chat profile - a participant's nickname and avatar inside chat

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::value_objects::ParticipantId;

/// Maximum nickname length in characters
pub const NICKNAME_MAX_CHARS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatProfile {
    pub participant_id: ParticipantId,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChatProfile {
    /// Create a profile for a participant seen for the first time
    pub fn new(participant_id: ParticipantId, nickname: String) -> Self {
        let now = Utc::now();
        Self {
            participant_id,
            nickname,
            avatar_url: None,
            last_seen_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fallback nickname when no display name is known
    pub fn default_nickname(participant_id: ParticipantId) -> String {
        format!("Trainer {participant_id}")
    }
}
