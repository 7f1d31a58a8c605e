//! Authentication utilities
//!
//! Provides:
//! - Password hashing and verification (argon2)
//! - Signed token generation and validation (used as the REST Bearer token
//!   and as the web session cookie value)
//! - `AuthUser` extractor for Bearer-authenticated API routes

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock};
use uuid::Uuid;

/// Authenticated caller, resolved from a validated token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    /// User ID
    pub user_id: Uuid,

    /// Login email at the time the token was issued
    pub email: String,
}

/// Token claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Login email
    pub email: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Token manager
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiration_secs: i64,
}

impl JwtManager {
    /// Create a new token manager with the given secret
    pub fn new(secret: &str, expiration_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiration_secs: i64::try_from(expiration_secs).unwrap_or(i64::MAX),
        }
    }

    /// Token lifetime in seconds
    pub fn expiration_secs(&self) -> i64 {
        self.expiration_secs
    }

    /// Generate a new token for a user
    pub fn generate_token(&self, user_id: Uuid, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expiration_secs);

        let claims = TokenClaims {
            sub: user_id.to_string(),
            email: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to generate token: {}", e),
        })
    }

    /// Validate and decode a token
    pub fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::InvalidToken,
            })
    }

    /// Validate a token and resolve the caller it was issued to
    pub fn authenticate(&self, token: &str) -> Result<AuthUser> {
        let claims = self.validate_token(token)?;
        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::InvalidToken)?;

        Ok(AuthUser {
            user_id,
            email: claims.email,
        })
    }
}

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Check a password against a stored hash.
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Hash checked for logins that match no account, so they pay for the same
/// argon2 verification as a wrong password
fn dummy_password_hash() -> &'static str {
    static DUMMY_HASH: OnceLock<String> = OnceLock::new();
    DUMMY_HASH.get_or_init(|| hash_password("beans-no-such-account").unwrap_or_default())
}

/// Run a verification against the dummy hash, discarding the outcome
pub fn verify_dummy_password(password: &str) {
    let _ = verify_password(password, dummy_password_hash());
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Axum extractor for Bearer-authenticated callers
impl<S> FromRequestParts<S> for AuthUser
where
    Arc<JwtManager>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized {
                message: "Authentication credentials were not provided".to_string(),
            })?;

        let token = extract_bearer_token(auth_header).ok_or_else(|| AppError::Unauthorized {
            message: "Expected a Bearer token".to_string(),
        })?;

        let jwt = Arc::<JwtManager>::from_ref(state);
        jwt.authenticate(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_hash_is_a_real_hash() {
        assert!(PasswordHash::new(dummy_password_hash()).is_ok());
        assert!(verify_password("beans-no-such-account", dummy_password_hash()));
        assert!(!verify_password("password123", dummy_password_hash()));
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("Token abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }

    #[test]
    fn test_token_roundtrip() {
        let manager = JwtManager::new("test_secret", 3600);
        let user_id = Uuid::new_v4();

        let token = manager.generate_token(user_id, "test@email.com").unwrap();
        let user = manager.authenticate(&token).unwrap();

        assert_eq!(user.user_id, user_id);
        assert_eq!(user.email, "test@email.com");
    }

    #[test]
    fn test_token_from_other_secret_is_rejected() {
        let issuer = JwtManager::new("secret_a", 3600);
        let verifier = JwtManager::new("secret_b", 3600);

        let token = issuer.generate_token(Uuid::new_v4(), "a@b.c").unwrap();
        assert!(matches!(
            verifier.authenticate(&token),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_garbage_token_is_rejected() {
        let manager = JwtManager::new("test_secret", 3600);
        assert!(matches!(
            manager.authenticate("not.a.token"),
            Err(AppError::InvalidToken)
        ));
    }
}
