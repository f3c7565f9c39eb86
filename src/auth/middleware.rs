//! Request authentication for protected routes.
//!
//! Pure functions over the request and the injected [`AuthState`]; nothing
//! here reads the body, so handlers keep full ownership of it.

use hyper::Request;
use std::net::{IpAddr, SocketAddr};

use super::jwt::extract_token_from_header;
use super::{AuthState, Claims};
use crate::types::{ApiError, Result};

/// Pull a token off the request, checking in order:
/// 1. `Authorization: Bearer <token>`
/// 2. `admin_token` cookie
/// 3. `x-auth-token` header
pub fn extract_token<B>(req: &Request<B>) -> Option<String> {
    if let Some(value) = req
        .headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = extract_token_from_header(value) {
            return Some(token.to_string());
        }
    }

    if let Some(cookies) = req
        .headers()
        .get(hyper::header::COOKIE)
        .and_then(|v| v.to_str().ok())
    {
        if let Some(token) = cookie_value(cookies, "admin_token") {
            return Some(token.to_string());
        }
    }

    req.headers()
        .get("x-auth-token")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Look up a cookie by name in a `Cookie` header value.
fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Best-effort client IP: X-Forwarded-For, then X-Real-IP, then the peer
/// address of the connection.
///
/// Forwarded headers are client-controlled, so this value is for session
/// metadata and logs only. Security decisions (the login rate limiter)
/// key on the socket peer address instead.
pub fn client_ip<B>(req: &Request<B>, peer: SocketAddr) -> IpAddr {
    if let Some(forwarded) = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(ip) = forwarded
            .split(',')
            .next()
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
        {
            return ip;
        }
    }

    if let Some(ip) = req
        .headers()
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<IpAddr>().ok())
    {
        return ip;
    }

    peer.ip()
}

/// Authenticate a request against the security stores.
///
/// Check order is fixed: token presence, revocation, signature and claims
/// (expiry reported distinctly), then the server-side session. A valid
/// signature is not enough once the session behind it is gone.
pub fn authenticate<B>(req: &Request<B>, auth: &AuthState) -> Result<Claims> {
    let token = extract_token(req).ok_or(ApiError::Unauthenticated)?;

    if auth.revoked.is_revoked(&token) {
        return Err(ApiError::Revoked);
    }

    let claims = auth.tokens.verify(&token)?;

    if let Some(ref session_id) = claims.session_id {
        if !auth.sessions.exists(session_id) {
            return Err(ApiError::SessionExpired);
        }
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{
        CredentialVerifier, LoginRateLimiter, RevocationList, Session, SessionRegistry,
        TokenService,
    };
    use std::time::Duration;

    fn test_auth_state() -> AuthState {
        AuthState {
            credentials: CredentialVerifier::new(
                "admin".to_string(),
                Some("password".to_string()),
                None,
            ),
            tokens: TokenService::new(
                "test-secret-key-that-is-long-enough".to_string(),
                "portfolio-api".to_string(),
                "portfolio-admin".to_string(),
                Duration::from_secs(1800),
                Duration::from_secs(604800),
            ),
            attempts: LoginRateLimiter::new(5, Duration::from_secs(3600)),
            sessions: SessionRegistry::new(),
            revoked: RevocationList::new(),
        }
    }

    fn login(auth: &AuthState, session_id: &str) -> String {
        auth.sessions.create(
            session_id.to_string(),
            Session::new(
                "admin".to_string(),
                "10.0.0.1".to_string(),
                "test".to_string(),
            ),
        );
        auth.tokens
            .issue("admin", Some(session_id.to_string()), false)
            .unwrap()
            .token
    }

    fn request_with_header(name: &str, value: &str) -> Request<()> {
        Request::builder()
            .uri("/api/v1/admin/profile")
            .header(name, value)
            .body(())
            .unwrap()
    }

    #[test]
    fn test_extract_from_bearer_header() {
        let req = request_with_header("authorization", "Bearer tok123");
        assert_eq!(extract_token(&req), Some("tok123".to_string()));
    }

    #[test]
    fn test_extract_from_cookie() {
        let req = request_with_header("cookie", "theme=dark; admin_token=tok456; lang=en");
        assert_eq!(extract_token(&req), Some("tok456".to_string()));
    }

    #[test]
    fn test_extract_from_x_auth_token() {
        let req = request_with_header("x-auth-token", "tok789");
        assert_eq!(extract_token(&req), Some("tok789".to_string()));
    }

    #[test]
    fn test_header_wins_over_cookie() {
        let req = Request::builder()
            .header("authorization", "Bearer header-token")
            .header("cookie", "admin_token=cookie-token")
            .header("x-auth-token", "x-token")
            .body(())
            .unwrap();
        assert_eq!(extract_token(&req), Some("header-token".to_string()));
    }

    #[test]
    fn test_no_token_sources() {
        let req = Request::builder().body(()).unwrap();
        assert_eq!(extract_token(&req), None);

        let req = request_with_header("cookie", "theme=dark");
        assert_eq!(extract_token(&req), None);
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "192.168.1.5:4444".parse().unwrap();

        let req = request_with_header("x-forwarded-for", "203.0.113.7, 10.0.0.1");
        assert_eq!(client_ip(&req, peer), "203.0.113.7".parse::<IpAddr>().unwrap());

        let req = request_with_header("x-real-ip", "203.0.113.9");
        assert_eq!(client_ip(&req, peer), "203.0.113.9".parse::<IpAddr>().unwrap());

        let req = Request::builder().body(()).unwrap();
        assert_eq!(client_ip(&req, peer), peer.ip());

        // Garbage forwarded header falls through to the peer address.
        let req = request_with_header("x-forwarded-for", "not-an-ip");
        assert_eq!(client_ip(&req, peer), peer.ip());
    }

    #[test]
    fn test_forged_forwarded_headers_do_not_evade_lockout() {
        let auth = test_auth_state();
        let peer: SocketAddr = "198.51.100.4:9000".parse().unwrap();

        // Failures key on the socket address, so a fresh forged header on
        // every attempt still accumulates against the same record.
        for i in 0..5 {
            let req = request_with_header("x-forwarded-for", &format!("203.0.113.{}", i));
            assert_ne!(client_ip(&req, peer), peer.ip());
            auth.attempts.record_failure(peer.ip());
        }

        assert!(matches!(
            auth.attempts.check(peer.ip()),
            Err(ApiError::RateLimited { .. })
        ));
    }

    #[test]
    fn test_authenticate_happy_path() {
        let auth = test_auth_state();
        let token = login(&auth, "s1");

        let req = request_with_header("authorization", &format!("Bearer {}", token));
        let claims = authenticate(&req, &auth).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.session_id.as_deref(), Some("s1"));
    }

    #[test]
    fn test_authenticate_missing_token() {
        let auth = test_auth_state();
        let req = Request::builder().body(()).unwrap();
        assert!(matches!(
            authenticate(&req, &auth),
            Err(ApiError::Unauthenticated)
        ));
    }

    #[test]
    fn test_authenticate_revoked_token() {
        let auth = test_auth_state();
        let token = login(&auth, "s1");
        auth.revoked.revoke(token.clone());

        let req = request_with_header("authorization", &format!("Bearer {}", token));
        assert!(matches!(authenticate(&req, &auth), Err(ApiError::Revoked)));
    }

    #[test]
    fn test_authenticate_terminated_session() {
        let auth = test_auth_state();
        let token = login(&auth, "s1");
        auth.sessions.remove("s1");

        // Signature still valid, session gone.
        let req = request_with_header("authorization", &format!("Bearer {}", token));
        assert!(matches!(
            authenticate(&req, &auth),
            Err(ApiError::SessionExpired)
        ));
    }

    #[test]
    fn test_authenticate_garbage_token() {
        let auth = test_auth_state();
        let req = request_with_header("authorization", "Bearer garbage");
        assert!(matches!(
            authenticate(&req, &auth),
            Err(ApiError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_authenticate_via_cookie() {
        let auth = test_auth_state();
        let token = login(&auth, "s1");

        let req = request_with_header("cookie", &format!("admin_token={}", token));
        assert!(authenticate(&req, &auth).is_ok());
    }
}
