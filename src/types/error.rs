use hyper::StatusCode;
use thiserror::Error;

/// Unified error type for the API.
///
/// Authentication failures are deliberately split into distinct variants so
/// handlers and clients can tell a malformed token from an expired one,
/// a revoked one, or a token whose server-side session is gone.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token has been revoked")]
    Revoked,

    #[error("Session expired or terminated")]
    SessionExpired,

    #[error("Too many login attempts, try again in {retry_after_secs} seconds")]
    RateLimited { retry_after_secs: u64 },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated
            | ApiError::InvalidCredentials
            | ApiError::InvalidToken(_)
            | ApiError::Expired
            | ApiError::Revoked
            | ApiError::SessionExpired => StatusCode::UNAUTHORIZED,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Config(_) | ApiError::Io(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable error code for response bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthenticated => "NOT_AUTHENTICATED",
            ApiError::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::Expired => "TOKEN_EXPIRED",
            ApiError::Revoked => "TOKEN_REVOKED",
            ApiError::SessionExpired => "SESSION_EXPIRED",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::Config(_) => "CONFIG_ERROR",
            ApiError::Io(_) => "IO_ERROR",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<mongodb::error::Error> for ApiError {
    fn from(err: mongodb::error::Error) -> Self {
        ApiError::Database(err.to_string())
    }
}

impl From<bson::ser::Error> for ApiError {
    fn from(err: bson::ser::Error) -> Self {
        ApiError::Database(format!("BSON serialization: {}", err))
    }
}

impl From<bson::de::Error> for ApiError {
    fn from(err: bson::de::Error) -> Self {
        ApiError::Database(format!("BSON deserialization: {}", err))
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("Invalid JSON: {}", err))
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => ApiError::Expired,
            ErrorKind::InvalidIssuer => ApiError::InvalidToken("invalid issuer".to_string()),
            ErrorKind::InvalidAudience => ApiError::InvalidToken("invalid audience".to_string()),
            ErrorKind::InvalidSignature => ApiError::InvalidToken("invalid signature".to_string()),
            _ => ApiError::InvalidToken(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_401() {
        for err in [
            ApiError::Unauthenticated,
            ApiError::InvalidCredentials,
            ApiError::InvalidToken("bad".to_string()),
            ApiError::Expired,
            ApiError::Revoked,
            ApiError::SessionExpired,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        }
    }

    #[test]
    fn test_rate_limited_maps_to_429() {
        let err = ApiError::RateLimited {
            retry_after_secs: 120,
        };
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "RATE_LIMITED");
    }

    #[test]
    fn test_expired_distinct_from_invalid() {
        assert_ne!(ApiError::Expired.code(), ApiError::InvalidToken("x".into()).code());
        assert_ne!(ApiError::Revoked.code(), ApiError::SessionExpired.code());
    }

    #[test]
    fn test_jwt_expired_maps_to_expired_variant() {
        let err = jsonwebtoken::errors::Error::from(
            jsonwebtoken::errors::ErrorKind::ExpiredSignature,
        );
        assert!(matches!(ApiError::from(err), ApiError::Expired));
    }
}
