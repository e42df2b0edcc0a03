//! Chat profile database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for chat_profiles table
#[derive(Debug, Clone, FromRow)]
pub struct ChatProfileModel {
    pub participant_id: i64,
    pub nickname: String,
    pub avatar_url: Option<String>,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
