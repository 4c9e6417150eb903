//! Identity Gate
//!
//! Verifies bearer tokens issued by the identity provider and exposes the
//! verified email claim to downstream components. Nothing is cached across
//! requests; every call re-verifies the token.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::shared::error::{PlatformError, Result};

/// Verified claims of an access token.
///
/// The subject is the user's email, the natural key of the user directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Subject: user email
    pub sub: String,
    /// Issuer
    pub iss: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiration (unix seconds)
    pub exp: i64,
}

impl AccessTokenClaims {
    pub fn email(&self) -> &str {
        &self.sub
    }
}

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret shared with the identity provider
    pub secret_key: String,
    pub issuer: String,
    pub access_token_expiry_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: "dev-secret-do-not-use-in-production".to_string(),
            issuer: "productpulse".to_string(),
            access_token_expiry_secs: 3600,
        }
    }
}

/// Token verification service (HS256)
pub struct AuthService {
    config: AuthConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthService {
    pub fn new(config: AuthConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret_key.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret_key.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// Issue an access token for the given email.
    pub fn generate_token(&self, email: &str) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = AccessTokenClaims {
            sub: email.to_string(),
            iss: self.config.issuer.clone(),
            iat: now,
            exp: now + self.config.access_token_expiry_secs,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| PlatformError::internal(format!("Token generation failed: {}", e)))
    }

    /// Verify a bearer token and return its claims.
    pub fn validate_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);

        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PlatformError::TokenExpired,
                _ => PlatformError::InvalidToken { message: format!("{}", e) },
            })
    }
}

/// Extract bearer token from Authorization header value
pub fn extract_bearer_token(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let service = AuthService::new(AuthConfig::default());

        let token = service.generate_token("test@example.com").unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.email(), "test@example.com");
        assert_eq!(claims.iss, "productpulse");
    }

    #[test]
    fn test_rejects_garbage_token() {
        let service = AuthService::new(AuthConfig::default());
        let err = service.validate_token("not-a-jwt").unwrap_err();
        assert!(matches!(err, PlatformError::InvalidToken { .. }));
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let issuing = AuthService::new(AuthConfig {
            secret_key: "secret-a".to_string(),
            ..AuthConfig::default()
        });
        let verifying = AuthService::new(AuthConfig {
            secret_key: "secret-b".to_string(),
            ..AuthConfig::default()
        });

        let token = issuing.generate_token("test@example.com").unwrap();
        assert!(verifying.validate_token(&token).is_err());
    }

    #[test]
    fn test_rejects_expired_token() {
        let service = AuthService::new(AuthConfig {
            access_token_expiry_secs: -120,
            ..AuthConfig::default()
        });

        let token = service.generate_token("test@example.com").unwrap();
        let err = service.validate_token(&token).unwrap_err();
        assert!(matches!(err, PlatformError::TokenExpired));
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer_token("Basic abc123"), None);
        assert_eq!(extract_bearer_token(""), None);
    }
}
