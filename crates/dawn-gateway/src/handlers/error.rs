//! Gateway error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use dawn_common::{AppError, ErrorResponse};
use dawn_core::DomainError;
use dawn_service::ServiceError;
use thiserror::Error;

use crate::protocol::{ErrorPayload, ServerEvent};

/// Wire code for a rejected handshake
pub const AUTHENTICATION_FAILED: &str = "AUTHENTICATION_FAILED";
/// Wire code for a room the participant does not belong to
pub const NOT_ROOM_MEMBER: &str = "NOT_ROOM_MEMBER";
/// Wire code for acting as someone else or outside a subscribed room
pub const FORBIDDEN: &str = "FORBIDDEN";
/// Wire code for malformed or invalid input
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
/// Wire code for an unrecognised client event
pub const UNKNOWN_MESSAGE: &str = "UNKNOWN_MESSAGE";
/// Wire code for a store failure
pub const PERSISTENCE_ERROR: &str = "PERSISTENCE_ERROR";

/// Gateway error type
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Bad or missing credential at handshake
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Not allowed to act on the room or identity
    #[error("{message}")]
    Authorization { code: &'static str, message: String },

    /// Malformed frame or invalid field
    #[error("{message}")]
    Validation { code: &'static str, message: String },

    /// Message store failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Pub/sub failure; logged, never sent to clients
    #[error("Transport error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: VALIDATION_ERROR,
            message: message.into(),
        }
    }

    pub fn unknown_event(name: &str) -> Self {
        Self::Validation {
            code: UNKNOWN_MESSAGE,
            message: format!("unknown event: {name}"),
        }
    }

    pub fn not_room_member() -> Self {
        Self::Authorization {
            code: NOT_ROOM_MEMBER,
            message: DomainError::NotRoomMember.to_string(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Authorization {
            code: FORBIDDEN,
            message: message.into(),
        }
    }

    /// Wire error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Authentication(_) => AUTHENTICATION_FAILED,
            Self::Authorization { code, .. } | Self::Validation { code, .. } => *code,
            Self::Persistence(_) | Self::Transport(_) => PERSISTENCE_ERROR,
        }
    }

    /// Whether the client should be told about this error
    pub fn is_client_visible(&self) -> bool {
        !matches!(self, Self::Transport(_))
    }

    /// `error` event for the connection that triggered this error
    pub fn to_event(&self, event: Option<&str>) -> ServerEvent {
        let message = match self {
            // Store details stay in the logs
            Self::Persistence(_) => "Failed to save changes, try again".to_string(),
            other => other.to_string(),
        };

        ServerEvent::Error(ErrorPayload {
            code: self.code().to_string(),
            message,
            event: event.map(str::to_string),
        })
    }
}

impl From<ServiceError> for GatewayError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => e.into(),
            ServiceError::Validation(message) => Self::validation(message),
            ServiceError::Internal(message) => Self::Persistence(message),
        }
    }
}

impl From<DomainError> for GatewayError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotRoomMember => Self::not_room_member(),
            e if e.is_authorization() => Self::forbidden(e.to_string()),
            e if e.is_infrastructure() => Self::Persistence(e.to_string()),
            e => Self::validation(e.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for GatewayError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::from(err).into()
    }
}

impl From<AppError> for GatewayError {
    fn from(err: AppError) -> Self {
        Self::Authentication(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization { .. } => StatusCode::FORBIDDEN,
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Persistence(_) | Self::Transport(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Gateway result type
pub type GatewayResult<T> = Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use super::*;
    use dawn_core::RoomId;

    #[test]
    fn test_domain_mapping() {
        assert_eq!(GatewayError::from(DomainError::NotRoomMember).code(), NOT_ROOM_MEMBER);
        assert_eq!(GatewayError::from(DomainError::NotRequestRecipient).code(), FORBIDDEN);
        assert_eq!(GatewayError::from(DomainError::EmptyMessage).code(), VALIDATION_ERROR);
        assert_eq!(
            GatewayError::from(DomainError::ContentTooLong { max: 2000 }).code(),
            VALIDATION_ERROR
        );
        assert_eq!(
            GatewayError::from(DomainError::DatabaseError("down".into())).code(),
            PERSISTENCE_ERROR
        );
        assert_eq!(
            GatewayError::from(DomainError::RoomNotFound(RoomId::new(1))).code(),
            VALIDATION_ERROR
        );
    }

    #[test]
    fn test_service_mapping() {
        let err: GatewayError = ServiceError::internal("boom").into();
        assert!(matches!(err, GatewayError::Persistence(_)));
        let err: GatewayError = ServiceError::validation("bad").into();
        assert_eq!(err.code(), VALIDATION_ERROR);
    }

    #[test]
    fn test_error_event_hides_store_details() {
        let event = GatewayError::Persistence("connection refused to 10.0.0.3".into())
            .to_event(Some("message:send"));
        match event {
            ServerEvent::Error(payload) => {
                assert_eq!(payload.code, PERSISTENCE_ERROR);
                assert!(!payload.message.contains("10.0.0.3"));
                assert_eq!(payload.event.as_deref(), Some("message:send"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_transport_is_not_client_visible() {
        assert!(!GatewayError::Transport("redis down".into()).is_client_visible());
        assert!(GatewayError::not_room_member().is_client_visible());
    }

    #[test]
    fn test_authentication_response_status() {
        let response = GatewayError::Authentication("missing token".into()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
