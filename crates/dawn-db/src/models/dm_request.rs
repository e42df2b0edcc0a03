//! DM request database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for chat_dm_requests table
#[derive(Debug, Clone, FromRow)]
pub struct DmRequestModel {
    pub id: i64,
    pub from_participant_id: i64,
    pub to_participant_id: i64,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
