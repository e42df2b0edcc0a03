//! DM request entity - an invitation to open a direct-message room

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::{DmRequestId, ParticipantId};

/// DM request lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DmRequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl DmRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Declined => "declined",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            "declined" => Some(Self::Declined),
            _ => None,
        }
    }
}

/// DM request entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DmRequest {
    pub id: DmRequestId,
    pub from_participant_id: ParticipantId,
    pub to_participant_id: ParticipantId,
    pub message: Option<String>,
    pub status: DmRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DmRequest {
    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == DmRequestStatus::Pending
    }

    /// Check whether `participant` is on either side of the request
    pub fn involves(&self, participant: ParticipantId) -> bool {
        self.from_participant_id == participant || self.to_participant_id == participant
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_from_db() {
        assert_eq!(DmRequestStatus::from_db("pending"), Some(DmRequestStatus::Pending));
        assert_eq!(DmRequestStatus::from_db("accepted"), Some(DmRequestStatus::Accepted));
        assert_eq!(DmRequestStatus::from_db("bogus"), None);
    }

    #[test]
    fn test_involves() {
        let now = Utc::now();
        let req = DmRequest {
            id: DmRequestId::new(1),
            from_participant_id: ParticipantId::new(10),
            to_participant_id: ParticipantId::new(20),
            message: None,
            status: DmRequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        assert!(req.is_pending());
        assert!(req.involves(ParticipantId::new(10)));
        assert!(req.involves(ParticipantId::new(20)));
        assert!(!req.involves(ParticipantId::new(30)));
    }
}
