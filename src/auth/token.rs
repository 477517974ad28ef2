//! JWT token management
//!
//! Issues and verifies signed access/refresh token pairs. Tokens are
//! self-contained: validity is decided by signature and expiry alone, there
//! is no server-side session or revocation state.

use crate::auth::{Identity, Role};
use crate::config::{AuthConfig, ConfigError};
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Tolerance applied when validating `exp`, so that a token verified in the
/// same second it was issued never fails on clock granularity.
const EXPIRY_LEEWAY_SECS: u64 = 5;

/// Token type claim. Checked explicitly on verification, never inferred
/// from the expiry.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenType::Access => write!(f, "access"),
            TokenType::Refresh => write!(f, "refresh"),
        }
    }
}

/// Why a presented token was rejected.
///
/// Callers must not forward the variant to HTTP clients; the response layer
/// collapses all of these into a single unauthenticated reply.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token signature is invalid")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("wrong token type: expected {expected}, found {found}")]
    WrongTokenType {
        expected: TokenType,
        found: TokenType,
    },

    #[error("malformed token")]
    Malformed,
}

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Role at issuance time; trusted for the token's lifetime
    pub role: Role,
    /// Access or refresh
    pub token_type: TokenType,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Token pair handed back on login and refresh
#[derive(Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Process-wide signing material, built once at startup from settings.
///
/// Read-only after construction; safe to share across request tasks.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenKeys {
    /// Build signing keys from configuration.
    ///
    /// An absent or empty secret is a startup failure, not something to
    /// discover on the first request.
    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        if config.secret.trim().is_empty() {
            return Err(ConfigError::MissingVar("SECRET_KEY".to_string()));
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = EXPIRY_LEEWAY_SECS;

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            access_ttl: Duration::minutes(config.access_ttl_minutes),
            refresh_ttl: Duration::days(config.refresh_ttl_days),
        })
    }

    /// Issue an access/refresh pair for a user.
    ///
    /// Pure token creation: nothing is persisted.
    pub fn issue(&self, user_id: Uuid, role: Role) -> Result<TokenPair, AppError> {
        let now = Utc::now();
        let iat = now.timestamp();

        let access_claims = Claims {
            sub: user_id,
            role,
            token_type: TokenType::Access,
            iat,
            exp: (now + self.access_ttl).timestamp(),
        };

        let refresh_claims = Claims {
            sub: user_id,
            role,
            token_type: TokenType::Refresh,
            iat,
            exp: (now + self.refresh_ttl).timestamp(),
        };

        Ok(TokenPair {
            access_token: self.sign(&access_claims)?,
            refresh_token: self.sign(&refresh_claims)?,
            token_type: "bearer".to_string(),
            expires_in: self.access_ttl.num_seconds(),
        })
    }

    fn sign(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AppError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Verify a presented token and reconstruct the caller's identity.
    ///
    /// The signature is checked before any claim is trusted. The role comes
    /// straight out of the claims; the credential store is not consulted.
    pub fn verify(&self, token: &str, expected: TokenType) -> Result<Identity, AuthError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                    jsonwebtoken::errors::ErrorKind::InvalidSignature => {
                        AuthError::InvalidSignature
                    }
                    _ => AuthError::Malformed,
                }
            })?;

        let claims = data.claims;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType {
                expected,
                found: claims.token_type,
            });
        }

        Ok(Identity {
            user_id: claims.sub,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_keys() -> TokenKeys {
        let config = AuthConfig {
            secret: "unit-test-signing-secret".to_string(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 7,
        };
        TokenKeys::from_config(&config).unwrap()
    }

    #[test]
    fn round_trip_preserves_identity() {
        let keys = test_keys();
        let user_id = Uuid::new_v4();

        let pair = keys.issue(user_id, Role::Manager).unwrap();
        let identity = keys.verify(&pair.access_token, TokenType::Access).unwrap();

        assert_eq!(identity.user_id, user_id);
        assert_eq!(identity.role, Role::Manager);

        let identity = keys.verify(&pair.refresh_token, TokenType::Refresh).unwrap();
        assert_eq!(identity.user_id, user_id);
    }

    #[test]
    fn expires_in_matches_access_ttl() {
        let keys = test_keys();
        let pair = keys.issue(Uuid::new_v4(), Role::Employee).unwrap();
        assert_eq!(pair.expires_in, 30 * 60);
        assert_eq!(pair.token_type, "bearer");
    }

    #[test]
    fn refresh_token_rejected_where_access_is_required() {
        let keys = test_keys();
        let pair = keys.issue(Uuid::new_v4(), Role::Employee).unwrap();

        let err = keys
            .verify(&pair.refresh_token, TokenType::Access)
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::WrongTokenType {
                expected: TokenType::Access,
                found: TokenType::Refresh,
            }
        ));
    }

    #[test]
    fn access_token_rejected_where_refresh_is_required() {
        let keys = test_keys();
        let pair = keys.issue(Uuid::new_v4(), Role::Admin).unwrap();

        let err = keys
            .verify(&pair.access_token, TokenType::Refresh)
            .unwrap_err();
        assert!(matches!(err, AuthError::WrongTokenType { .. }));
    }

    #[test]
    fn expired_token_fails_even_with_valid_signature() {
        let keys = test_keys();
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: Uuid::new_v4(),
            role: Role::Employee,
            token_type: TokenType::Access,
            iat: now - 7200,
            exp: now - 3600,
        };

        let token = keys.sign(&claims).unwrap();
        let err = keys.verify(&token, TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let keys = test_keys();
        let pair = keys.issue(Uuid::new_v4(), Role::Employee).unwrap();

        let (head, signature) = pair.access_token.rsplit_once('.').unwrap();
        let mid = signature.len() / 2;
        let flipped = if signature.as_bytes()[mid] == b'A' { 'B' } else { 'A' };
        let mut tampered_sig = signature.to_string();
        tampered_sig.replace_range(mid..mid + 1, &flipped.to_string());
        let tampered = format!("{}.{}", head, tampered_sig);

        let err = keys.verify(&tampered, TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let keys = test_keys();
        let pair = keys.issue(Uuid::new_v4(), Role::Employee).unwrap();

        let mut parts: Vec<String> = pair
            .access_token
            .split('.')
            .map(|s| s.to_string())
            .collect();
        let mid = parts[1].len() / 2;
        let flipped = if parts[1].as_bytes()[mid] == b'A' { "B" } else { "A" };
        parts[1].replace_range(mid..mid + 1, flipped);

        let err = keys.verify(&parts.join("."), TokenType::Access).unwrap_err();
        // Payload corruption surfaces as either a signature mismatch or an
        // undecodable token; both are authentication failures, never success.
        assert!(matches!(
            err,
            AuthError::InvalidSignature | AuthError::Malformed
        ));
    }

    #[test]
    fn garbage_input_is_malformed() {
        let keys = test_keys();
        assert!(matches!(
            keys.verify("definitely-not-a-jwt", TokenType::Access),
            Err(AuthError::Malformed)
        ));
        assert!(matches!(
            keys.verify("a.b.c", TokenType::Access),
            Err(AuthError::Malformed)
        ));
        assert!(matches!(
            keys.verify("", TokenType::Access),
            Err(AuthError::Malformed)
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let keys = test_keys();
        let other = TokenKeys::from_config(&AuthConfig {
            secret: "a-different-secret".to_string(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 7,
        })
        .unwrap();

        let pair = other.issue(Uuid::new_v4(), Role::Admin).unwrap();
        let err = keys.verify(&pair.access_token, TokenType::Access).unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature));
    }

    #[test]
    fn empty_secret_is_a_configuration_error() {
        let config = AuthConfig {
            secret: "   ".to_string(),
            access_ttl_minutes: 30,
            refresh_ttl_days: 7,
        };
        assert!(matches!(
            TokenKeys::from_config(&config),
            Err(ConfigError::MissingVar(_))
        ));
    }
}
