//! JWT verification for gateway handshakes
//!
//! Tokens are minted by the platform's auth service; the chat gateway only
//! verifies them with the shared HS256 secret. `JwtService::issue` exists for
//! tests and local tooling.

use chrono::{Duration, Utc};
use dawn_core::ParticipantId;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (participant / trainer ID)
    pub sub: String,
    /// Display name known to the issuer, used to seed the chat profile
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Get the participant ID from the subject
    ///
    /// # Errors
    /// Returns an error if the subject is not a positive integer
    pub fn participant_id(&self) -> Result<ParticipantId, AppError> {
        match self.sub.parse::<ParticipantId>() {
            Ok(id) if id.into_inner() > 0 => Ok(id),
            _ => Err(AppError::InvalidToken),
        }
    }

    /// Check if the token is expired
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }
}

/// JWT service for verifying (and in tests, issuing) tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a token for a participant
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue(
        &self,
        participant_id: ParticipantId,
        name: Option<&str>,
        ttl_secs: i64,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let claims = Claims {
            sub: participant_id.to_string(),
            name: name.map(str::to_string),
            iat: now.timestamp(),
            exp: (now + Duration::seconds(ttl_secs)).timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to encode JWT")))
    }

    /// Decode and validate a JWT token
    ///
    /// # Errors
    /// Returns an error if the token is invalid or expired
    pub fn verify(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::default();

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
                _ => AppError::InvalidToken,
            }
        })?;

        Ok(token_data.claims)
    }
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService").finish_non_exhaustive()
    }
}

/// Strip a case-insensitive `Bearer ` prefix, returning the raw token
pub fn strip_bearer(value: &str) -> Option<&str> {
    let value = value.trim();
    let (scheme, token) = value.split_once(' ')?;
    if scheme.eq_ignore_ascii_case("bearer") && !token.trim().is_empty() {
        Some(token.trim())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test-secret-key-that-is-long-enough")
    }

    #[test]
    fn test_issue_and_verify() {
        let service = create_test_service();
        let token = service.issue(ParticipantId::new(12345), Some("Ash"), 900).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, "12345");
        assert_eq!(claims.name.as_deref(), Some("Ash"));
        assert_eq!(claims.participant_id().unwrap(), ParticipantId::new(12345));
        assert!(!claims.is_expired());
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service();
        // Past the default 60s leeway
        let token = service.issue(ParticipantId::new(1), None, -120).unwrap();

        assert!(matches!(service.verify(&token), Err(AppError::TokenExpired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_test_service()
            .issue(ParticipantId::new(1), None, 900)
            .unwrap();
        let other = JwtService::new("another-secret");

        assert!(matches!(other.verify(&token), Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_invalid_token() {
        let service = create_test_service();

        let result = service.verify("invalid.token.here");
        assert!(matches!(result, Err(AppError::InvalidToken)));
    }

    #[test]
    fn test_claims_participant_id() {
        let mut claims = Claims {
            sub: "12345".to_string(),
            name: None,
            iat: 0,
            exp: i64::MAX,
        };
        assert_eq!(claims.participant_id().unwrap(), ParticipantId::new(12345));

        claims.sub = "0".to_string();
        assert!(claims.participant_id().is_err());

        claims.sub = "trainer".to_string();
        assert!(claims.participant_id().is_err());
    }

    #[test]
    fn test_strip_bearer() {
        assert_eq!(strip_bearer("Bearer abc.def"), Some("abc.def"));
        assert_eq!(strip_bearer("bearer abc"), Some("abc"));
        assert_eq!(strip_bearer("Basic abc"), None);
        assert_eq!(strip_bearer("Bearer "), None);
        assert_eq!(strip_bearer("abc"), None);
    }
}
