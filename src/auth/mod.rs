//! Admin authentication: credentials, tokens, sessions, and rate limiting.
//!
//! All state lives in injected stores owned by [`AuthState`]; nothing here
//! touches globals, so tests can construct isolated instances freely.

pub mod credentials;
pub mod jwt;
pub mod middleware;
pub mod rate_limit;
pub mod revocation;
pub mod session;

pub use credentials::CredentialVerifier;
pub use jwt::{extract_token_from_header, Claims, TokenService};
pub use middleware::{authenticate, client_ip, extract_token};
pub use rate_limit::LoginRateLimiter;
pub use revocation::RevocationList;
pub use session::{Session, SessionRegistry};

use crate::config::Args;
use crate::types::{ApiError, Result};
use std::time::Duration;

/// Bundle of the in-memory security stores plus the token and credential
/// services. One instance lives in the shared application state.
pub struct AuthState {
    pub credentials: CredentialVerifier,
    pub tokens: TokenService,
    pub attempts: LoginRateLimiter,
    pub sessions: SessionRegistry,
    pub revoked: RevocationList,
}

impl AuthState {
    pub fn from_config(args: &Args) -> Result<Self> {
        let secret = args
            .effective_jwt_secret()
            .ok_or_else(|| ApiError::Config("JWT_SECRET is not configured".to_string()))?;

        Ok(Self {
            credentials: CredentialVerifier::from_config(args),
            tokens: TokenService::new(
                secret,
                args.token_issuer.clone(),
                args.token_audience.clone(),
                Duration::from_secs(args.token_ttl_seconds),
                Duration::from_secs(args.remember_ttl_seconds),
            ),
            attempts: LoginRateLimiter::new(
                args.max_login_attempts,
                Duration::from_secs(args.lockout_seconds),
            ),
            sessions: SessionRegistry::new(),
            revoked: RevocationList::new(),
        })
    }
}
