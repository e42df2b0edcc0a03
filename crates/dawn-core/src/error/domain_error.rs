//! Domain errors - error types for the domain layer

use thiserror::Error;

use crate::value_objects::{DmRequestId, MessageId, ParticipantId, RoomId};

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    // =========================================================================
    // Not Found Errors
    // =========================================================================
    #[error("Room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("Message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("DM request not found: {0}")]
    DmRequestNotFound(DmRequestId),

    #[error("Chat profile not found for participant {0}")]
    ProfileNotFound(ParticipantId),

    #[error("Member not found in room")]
    MemberNotFound,

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Message must have content or an image")]
    EmptyMessage,

    #[error("Content too long: max {max} characters")]
    ContentTooLong { max: usize },

    #[error("Invalid nickname: {0}")]
    InvalidNickname(String),

    #[error("Reply target is not a message in this room")]
    InvalidReplyTarget,

    #[error("Cannot open a DM with yourself")]
    CannotDmSelf,

    // =========================================================================
    // Authorization Errors
    // =========================================================================
    #[error("Not a member of this room")]
    NotRoomMember,

    #[error("Not authorized to respond to this request")]
    NotRequestRecipient,

    // =========================================================================
    // Conflict Errors
    // =========================================================================
    #[error("Already a member of this room")]
    AlreadyMember,

    #[error("DM room already exists")]
    DmRoomExists,

    #[error("Request already sent")]
    DmRequestAlreadySent,

    // =========================================================================
    // Business Rule Violations
    // =========================================================================
    #[error("Request is no longer pending")]
    DmRequestNotPending,

    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl DomainError {
    /// Get an error code string for client-facing error payloads
    pub fn code(&self) -> &'static str {
        match self {
            // Not Found
            Self::RoomNotFound(_) => "UNKNOWN_ROOM",
            Self::MessageNotFound(_) => "UNKNOWN_MESSAGE",
            Self::DmRequestNotFound(_) => "UNKNOWN_DM_REQUEST",
            Self::ProfileNotFound(_) => "UNKNOWN_PROFILE",
            Self::MemberNotFound => "UNKNOWN_MEMBER",

            // Validation
            Self::ValidationError(_) => "VALIDATION_ERROR",
            Self::EmptyMessage => "EMPTY_MESSAGE",
            Self::ContentTooLong { .. } => "CONTENT_TOO_LONG",
            Self::InvalidNickname(_) => "INVALID_NICKNAME",
            Self::InvalidReplyTarget => "INVALID_REPLY_TARGET",
            Self::CannotDmSelf => "CANNOT_DM_SELF",

            // Authorization
            Self::NotRoomMember => "NOT_ROOM_MEMBER",
            Self::NotRequestRecipient => "NOT_REQUEST_RECIPIENT",

            // Conflict
            Self::AlreadyMember => "ALREADY_MEMBER",
            Self::DmRoomExists => "DM_ROOM_EXISTS",
            Self::DmRequestAlreadySent => "DM_REQUEST_ALREADY_SENT",

            // Business Rules
            Self::DmRequestNotPending => "DM_REQUEST_NOT_PENDING",

            // Infrastructure
            Self::DatabaseError(_) => "DATABASE_ERROR",
            Self::CacheError(_) => "CACHE_ERROR",
            Self::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::RoomNotFound(_)
                | Self::MessageNotFound(_)
                | Self::DmRequestNotFound(_)
                | Self::ProfileNotFound(_)
                | Self::MemberNotFound
        )
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ValidationError(_)
                | Self::EmptyMessage
                | Self::ContentTooLong { .. }
                | Self::InvalidNickname(_)
                | Self::InvalidReplyTarget
                | Self::CannotDmSelf
        )
    }

    /// Check if this is an authorization error
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::NotRoomMember | Self::NotRequestRecipient)
    }

    /// Check if this is a conflict error
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyMember
                | Self::DmRoomExists
                | Self::DmRequestAlreadySent
                | Self::DmRequestNotPending
        )
    }

    /// Check if this wraps an infrastructure failure
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::DatabaseError(_) | Self::CacheError(_) | Self::InternalError(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(DomainError::RoomNotFound(RoomId::new(1)).code(), "UNKNOWN_ROOM");
        assert_eq!(DomainError::NotRoomMember.code(), "NOT_ROOM_MEMBER");
    }

    #[test]
    fn test_categories() {
        assert!(DomainError::RoomNotFound(RoomId::new(1)).is_not_found());
        assert!(DomainError::EmptyMessage.is_validation());
        assert!(DomainError::NotRoomMember.is_authorization());
        assert!(DomainError::DmRoomExists.is_conflict());
        assert!(DomainError::DatabaseError("down".into()).is_infrastructure());
        assert!(!DomainError::NotRoomMember.is_not_found());
    }

    #[test]
    fn test_error_display() {
        let err = DomainError::RoomNotFound(RoomId::new(123));
        assert_eq!(err.to_string(), "Room not found: 123");

        let err = DomainError::ContentTooLong { max: 2000 };
        assert_eq!(err.to_string(), "Content too long: max 2000 characters");
    }
}
