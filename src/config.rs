//! Configuration for the portfolio API
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Portfolio API - backend for a personal portfolio site
#[derive(Parser, Debug, Clone)]
#[command(name = "portfolio-api")]
#[command(about = "REST API backend for a personal portfolio site")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "portfolio")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required in production, min 32 bytes)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, env = "TOKEN_TTL_SECONDS", default_value = "1800")]
    pub token_ttl_seconds: u64,

    /// Extended token lifetime for "remember me" logins, in seconds
    #[arg(long, env = "REMEMBER_TTL_SECONDS", default_value = "604800")]
    pub remember_ttl_seconds: u64,

    /// Issuer claim stamped into tokens and required on verification
    #[arg(long, env = "TOKEN_ISSUER", default_value = "portfolio-api")]
    pub token_issuer: String,

    /// Audience claim stamped into tokens and required on verification
    #[arg(long, env = "TOKEN_AUDIENCE", default_value = "portfolio-admin")]
    pub token_audience: String,

    /// Admin account username
    #[arg(long, env = "ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,

    /// Admin account password in plaintext (dev convenience; prefer the hash)
    #[arg(long, env = "ADMIN_PASSWORD")]
    pub admin_password: Option<String>,

    /// Argon2 hash of the admin password (takes precedence over ADMIN_PASSWORD)
    #[arg(long, env = "ADMIN_PASSWORD_HASH")]
    pub admin_password_hash: Option<String>,

    /// Failed login attempts per IP before lockout
    #[arg(long, env = "MAX_LOGIN_ATTEMPTS", default_value = "5")]
    pub max_login_attempts: u32,

    /// Lockout window in seconds, measured from the first failed attempt
    #[arg(long, env = "LOCKOUT_SECONDS", default_value = "3600")]
    pub lockout_seconds: u64,

    /// Directory for uploaded files
    #[arg(long, env = "UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Maximum accepted upload size in bytes
    #[arg(long, env = "MAX_UPLOAD_BYTES", default_value = "10485760")]
    pub max_upload_bytes: usize,

    /// Enable development mode (permits missing JWT_SECRET and admin password)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn effective_jwt_secret(&self) -> Option<String> {
        if let Some(ref secret) = self.jwt_secret {
            return Some(secret.clone());
        }
        if self.dev_mode {
            return Some("dev-only-insecure-secret-do-not-deploy".to_string());
        }
        None
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.dev_mode {
            match self.jwt_secret {
                None => return Err("JWT_SECRET is required in production mode".to_string()),
                Some(ref s) if s.len() < 32 => {
                    return Err("JWT_SECRET must be at least 32 bytes".to_string())
                }
                _ => {}
            }

            if self.admin_password.is_none() && self.admin_password_hash.is_none() {
                return Err(
                    "ADMIN_PASSWORD or ADMIN_PASSWORD_HASH is required in production mode"
                        .to_string(),
                );
            }
        }

        if self.max_login_attempts == 0 {
            return Err("MAX_LOGIN_ATTEMPTS must be at least 1".to_string());
        }

        if self.token_ttl_seconds == 0 || self.remember_ttl_seconds < self.token_ttl_seconds {
            return Err(
                "REMEMBER_TTL_SECONDS must be at least TOKEN_TTL_SECONDS, both non-zero"
                    .to_string(),
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["portfolio-api", "--dev-mode"])
    }

    #[test]
    fn test_dev_mode_allows_missing_secret() {
        let args = base_args();
        assert!(args.validate().is_ok());
        assert!(args.effective_jwt_secret().is_some());
    }

    #[test]
    fn test_production_requires_secret_and_password() {
        let args = Args::parse_from(["portfolio-api"]);
        assert!(args.validate().is_err());

        let args = Args::parse_from([
            "portfolio-api",
            "--jwt-secret",
            "0123456789abcdef0123456789abcdef",
            "--admin-password",
            "hunter2hunter2",
        ]);
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_short_secret_rejected() {
        let args = Args::parse_from([
            "portfolio-api",
            "--jwt-secret",
            "short",
            "--admin-password",
            "hunter2hunter2",
        ]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut args = base_args();
        args.max_login_attempts = 0;
        assert!(args.validate().is_err());
    }
}
