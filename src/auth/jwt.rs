//! JWT issuing and validation for admin sessions.
//!
//! Tokens are HS256-signed and carry issuer, audience, a unique `jti`, and
//! the server-side session id they were minted for. Verification rejects
//! bad signatures, wrong issuer or audience, and expiry — with expiry
//! reported as its own error variant so clients can prompt a re-login
//! instead of treating the token as garbage.

use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::types::{ApiError, Result};

/// JWT claims for an admin access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (admin username)
    pub sub: String,
    /// Token type, always "access"
    pub token_type: String,
    /// Server-side session this token is bound to
    pub session_id: Option<String>,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (unix seconds)
    pub iat: u64,
    /// Expiry (unix seconds)
    pub exp: u64,
    /// Unique token id
    pub jti: String,
}

/// A freshly issued token together with its lifetime in seconds.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
    pub claims: Claims,
}

/// Issues and verifies admin tokens with a shared HS256 secret.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    ttl: Duration,
    remember_ttl: Duration,
}

impl TokenService {
    pub fn new(
        secret: String,
        issuer: String,
        audience: String,
        ttl: Duration,
        remember_ttl: Duration,
    ) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            ttl,
            remember_ttl,
        }
    }

    /// Issue a token for `username` bound to `session_id`.
    ///
    /// `remember` selects the extended lifetime.
    pub fn issue(
        &self,
        username: &str,
        session_id: Option<String>,
        remember: bool,
    ) -> Result<IssuedToken> {
        let lifetime = if remember { self.remember_ttl } else { self.ttl };
        let now = Utc::now().timestamp() as u64;

        let claims = Claims {
            sub: username.to_string(),
            token_type: "access".to_string(),
            session_id,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + lifetime.as_secs(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;

        Ok(IssuedToken {
            token,
            expires_in: lifetime.as_secs(),
            claims,
        })
    }

    /// Verify a token's signature, issuer, audience, and expiry.
    pub fn verify(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        // No leeway: a token is expired the second its exp passes.
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        if data.claims.token_type != "access" {
            return Err(ApiError::InvalidToken(format!(
                "unexpected token type '{}'",
                data.claims.token_type
            )));
        }

        Ok(data.claims)
    }
}

/// Extract a bearer token from an Authorization header value.
pub fn extract_token_from_header(header_value: &str) -> Option<&str> {
    header_value.strip_prefix("Bearer ").map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            "test-secret-key-that-is-long-enough".to_string(),
            "portfolio-api".to_string(),
            "portfolio-admin".to_string(),
            Duration::from_secs(1800),
            Duration::from_secs(604800),
        )
    }

    #[test]
    fn test_issue_and_verify() {
        let svc = service();
        let issued = svc
            .issue("admin", Some("session-1".to_string()), false)
            .unwrap();

        assert_eq!(issued.expires_in, 1800);

        let claims = svc.verify(&issued.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.session_id.as_deref(), Some("session-1"));
        assert_eq!(claims.exp, claims.iat + 1800);
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_remember_extends_lifetime() {
        let svc = service();
        let issued = svc.issue("admin", None, true).unwrap();
        assert_eq!(issued.expires_in, 604800);
        assert_eq!(issued.claims.exp, issued.claims.iat + 604800);
    }

    #[test]
    fn test_unique_jti() {
        let svc = service();
        let a = svc.issue("admin", None, false).unwrap();
        let b = svc.issue("admin", None, false).unwrap();
        assert_ne!(a.claims.jti, b.claims.jti);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let svc = service();
        let other = TokenService::new(
            "another-secret-key-also-long-enough".to_string(),
            "portfolio-api".to_string(),
            "portfolio-admin".to_string(),
            Duration::from_secs(1800),
            Duration::from_secs(604800),
        );

        let issued = svc.issue("admin", None, false).unwrap();
        assert!(matches!(
            other.verify(&issued.token),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let svc = service();
        let other = TokenService::new(
            "test-secret-key-that-is-long-enough".to_string(),
            "someone-else".to_string(),
            "portfolio-admin".to_string(),
            Duration::from_secs(1800),
            Duration::from_secs(604800),
        );

        let issued = other.issue("admin", None, false).unwrap();
        assert!(matches!(
            svc.verify(&issued.token),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let svc = service();
        let other = TokenService::new(
            "test-secret-key-that-is-long-enough".to_string(),
            "portfolio-api".to_string(),
            "some-other-app".to_string(),
            Duration::from_secs(1800),
            Duration::from_secs(604800),
        );

        let issued = other.issue("admin", None, false).unwrap();
        assert!(matches!(
            svc.verify(&issued.token),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_expired_token_reported_as_expired() {
        let svc = service();
        let now = Utc::now().timestamp() as u64;

        let claims = Claims {
            sub: "admin".to_string(),
            token_type: "access".to_string(),
            session_id: None,
            iss: "portfolio-api".to_string(),
            aud: "portfolio-admin".to_string(),
            iat: now - 3600,
            exp: now - 10,
            jti: "expired-test".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-that-is-long-enough"),
        )
        .unwrap();

        assert!(matches!(svc.verify(&token), Err(ApiError::Expired)));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let svc = service();
        assert!(matches!(
            svc.verify("not.a.token"),
            Err(ApiError::InvalidToken(_))
        ));
        assert!(matches!(svc.verify(""), Err(ApiError::InvalidToken(_))));
    }

    #[test]
    fn test_wrong_token_type_rejected() {
        let svc = service();
        let now = Utc::now().timestamp() as u64;

        let claims = Claims {
            sub: "admin".to_string(),
            token_type: "refresh".to_string(),
            session_id: None,
            iss: "portfolio-api".to_string(),
            aud: "portfolio-admin".to_string(),
            iat: now,
            exp: now + 3600,
            jti: "type-test".to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-that-is-long-enough"),
        )
        .unwrap();

        assert!(matches!(svc.verify(&token), Err(ApiError::InvalidToken(_))));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(extract_token_from_header("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_token_from_header("Basic abc123"), None);
        assert_eq!(extract_token_from_header(""), None);
    }
}
