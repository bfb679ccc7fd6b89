//! Stateless bearer token service.
//!
//! Issues and verifies self-contained HS256 tokens. The signing secret is a
//! configuration input; rotation is out of scope. Verification is purely
//! synchronous cryptographic work.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use mercadito_core::{Role, UserId};

use crate::models::UserRecord;

/// Default bearer token lifetime: 12 hours.
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 12 * 60 * 60;

/// Errors from issuing or verifying a bearer token.
#[derive(Debug, Error)]
pub enum TokenError {
    /// No token was presented with the request.
    #[error("no token provided")]
    Missing,

    /// The signature check failed or the expiry has elapsed.
    #[error("invalid or expired token")]
    InvalidOrExpired,

    /// Token could not be signed (malformed key material).
    #[error("token issuance failed: {0}")]
    Issuance(#[from] jsonwebtoken::errors::Error),
}

/// Claims embedded in every issued token.
///
/// `role` is deliberately included so that authorization decisions on the
/// token path are self-contained instead of depending on the (spoofable)
/// attribute cookie. A promoted or demoted user must log in again for the
/// claim to update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the user's store ID.
    pub sub: UserId,
    /// Email at issuance time.
    pub email: String,
    /// Role at issuance time.
    pub role: Role,
    /// Issued-at (Unix timestamp, seconds).
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds).
    pub exp: i64,
}

/// Issues and verifies bearer tokens with a single process-wide secret.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
}

impl TokenService {
    /// Create a token service with the default 12-hour lifetime.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        Self::with_ttl(secret, DEFAULT_TOKEN_TTL_SECS)
    }

    /// Create a token service with an explicit lifetime in seconds.
    ///
    /// Tests use this to exercise expiry without waiting 12 hours.
    #[must_use]
    pub fn with_ttl(secret: &SecretString, ttl_secs: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl_secs,
        }
    }

    /// Issue a signed token for an identity record.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Issuance`] if signing fails.
    pub fn issue(&self, user: &UserRecord) -> Result<String, TokenError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user.id,
            email: user.email.as_str().to_owned(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_secs,
        };

        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Verify a token string and return its decoded claims.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::InvalidOrExpired`] when the signature check
    /// fails or the expiry has elapsed.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|_| TokenError::InvalidOrExpired)
    }

    /// Verify the token carried in an `Authorization` header, if any.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Missing`] when no header (or no `Bearer` token
    /// in it) is present, [`TokenError::InvalidOrExpired`] when
    /// verification fails.
    pub fn verify_bearer(&self, header: Option<&str>) -> Result<Claims, TokenError> {
        let header = header.ok_or(TokenError::Missing)?;
        let token = header.strip_prefix("Bearer ").ok_or(TokenError::Missing)?;
        self.verify(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use mercadito_core::{Email, Provenance};

    use super::*;

    fn secret() -> SecretString {
        SecretString::from("test-signing-secret-0123456789abcdef")
    }

    fn user() -> UserRecord {
        UserRecord {
            id: UserId::new(42),
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            email: Email::parse("ana@gmail.com").unwrap(),
            age: 30,
            password: "digest".to_string(),
            role: Role::User,
            phone: None,
            provenance: Provenance::Password,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let service = TokenService::new(&secret());
        let token = service.issue(&user()).unwrap();

        let claims = service.verify(&token).unwrap();
        assert_eq!(claims.sub, UserId::new(42));
        assert_eq!(claims.email, "ana@gmail.com");
        assert_eq!(claims.role, Role::User);
        assert!(claims.exp - claims.iat == DEFAULT_TOKEN_TTL_SECS);
    }

    #[test]
    fn test_verify_fails_after_expiry() {
        // Issue a token that expired in the past. jsonwebtoken applies a
        // default 60s leeway, so go beyond it.
        let service = TokenService::with_ttl(&secret(), -120);
        let token = service.issue(&user()).unwrap();

        assert!(matches!(
            service.verify(&token),
            Err(TokenError::InvalidOrExpired)
        ));
    }

    #[test]
    fn test_verify_fails_with_wrong_secret() {
        let token = TokenService::new(&secret()).issue(&user()).unwrap();

        let other = TokenService::new(&SecretString::from(
            "another-signing-secret-0123456789ab",
        ));
        assert!(matches!(
            other.verify(&token),
            Err(TokenError::InvalidOrExpired)
        ));
    }

    #[test]
    fn test_verify_bearer_missing_header() {
        let service = TokenService::new(&secret());
        assert!(matches!(
            service.verify_bearer(None),
            Err(TokenError::Missing)
        ));
    }

    #[test]
    fn test_verify_bearer_strips_scheme() {
        let service = TokenService::new(&secret());
        let token = service.issue(&user()).unwrap();

        let claims = service
            .verify_bearer(Some(&format!("Bearer {token}")))
            .unwrap();
        assert_eq!(claims.sub, UserId::new(42));
    }

    #[test]
    fn test_verify_bearer_rejects_garbage() {
        let service = TokenService::new(&secret());
        assert!(matches!(
            service.verify_bearer(Some("Bearer not.a.token")),
            Err(TokenError::InvalidOrExpired)
        ));
    }

    #[test]
    fn test_claims_carry_role_for_admin() {
        let service = TokenService::new(&secret());
        let mut admin = user();
        admin.role = Role::Admin;

        let claims = service.verify(&service.issue(&admin).unwrap()).unwrap();
        assert_eq!(claims.role, Role::Admin);
    }
}
