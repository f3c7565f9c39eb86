//! Admin credential verification.
//!
//! The single admin account comes from configuration: a username plus either
//! an Argon2id password hash (preferred) or a plaintext password for local
//! development. All string comparisons against configured secrets are
//! constant-time.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use subtle::ConstantTimeEq;

use crate::config::Args;
use crate::types::{ApiError, Result};

/// Hash a password using Argon2id, returning the PHC-formatted string.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {e}")))
}

/// Verify a password against a PHC-formatted Argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ApiError::Config(format!("Invalid password hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Constant-time equality for credential strings.
///
/// Length mismatch returns early; only the byte contents are secret.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Checks submitted credentials against the configured admin account.
pub struct CredentialVerifier {
    username: String,
    password: Option<String>,
    password_hash: Option<String>,
}

impl CredentialVerifier {
    pub fn new(username: String, password: Option<String>, password_hash: Option<String>) -> Self {
        Self {
            username,
            password,
            password_hash,
        }
    }

    pub fn from_config(args: &Args) -> Self {
        Self::new(
            args.admin_username.clone(),
            args.admin_password.clone(),
            args.admin_password_hash.clone(),
        )
    }

    /// Verify a username/password pair.
    ///
    /// Both checks always run so a wrong username costs the same as a wrong
    /// password. Returns Ok(true) only when both match.
    pub fn verify(&self, username: &str, password: &str) -> Result<bool> {
        let username_ok = constant_time_eq(username, &self.username);

        let password_ok = if let Some(ref hash) = self.password_hash {
            verify_password(password, hash)?
        } else if let Some(ref plain) = self.password {
            constant_time_eq(password, plain)
        } else {
            return Err(ApiError::Config(
                "No admin password or password hash configured".to_string(),
            ));
        };

        Ok(username_ok & password_ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let password = "correct-horse-battery-staple";
        let hash = hash_password(password).unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(password, &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_different_salts() {
        let password = "same-password";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();

        assert_ne!(hash1, hash2);
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        assert!(verify_password("password", "not-a-valid-hash").is_err());
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("secret", "secret"));
        assert!(!constant_time_eq("secret", "secreT"));
        assert!(!constant_time_eq("secret", "secret-longer"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn test_plaintext_credentials() {
        let verifier =
            CredentialVerifier::new("admin".to_string(), Some("hunter2".to_string()), None);

        assert!(verifier.verify("admin", "hunter2").unwrap());
        assert!(!verifier.verify("admin", "wrong").unwrap());
        assert!(!verifier.verify("root", "hunter2").unwrap());
    }

    #[test]
    fn test_hashed_credentials_take_precedence() {
        let hash = hash_password("real-password").unwrap();
        let verifier = CredentialVerifier::new(
            "admin".to_string(),
            Some("ignored-plaintext".to_string()),
            Some(hash),
        );

        assert!(verifier.verify("admin", "real-password").unwrap());
        assert!(!verifier.verify("admin", "ignored-plaintext").unwrap());
    }

    #[test]
    fn test_missing_password_is_config_error() {
        let verifier = CredentialVerifier::new("admin".to_string(), None, None);
        assert!(matches!(
            verifier.verify("admin", "anything"),
            Err(ApiError::Config(_))
        ));
    }
}
