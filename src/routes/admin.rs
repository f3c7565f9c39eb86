//! Admin authentication and security routes
//!
//! - POST /api/v1/admin/login              - credentials -> token + session
//! - POST /api/v1/admin/logout             - best-effort revoke, always succeeds
//! - GET  /api/v1/admin/profile            - current admin identity
//! - GET  /api/v1/admin/security-status    - sessions, lockouts, revocations
//! - POST /api/v1/admin/terminate-session/{id} - kill one of the caller's sessions
//! - POST /api/v1/admin/emergency-lockdown - kill all the caller's OTHER sessions
//! - POST /api/v1/admin/reset-security     - clear lockouts and revocations
//! - GET  /api/v1/admin/dashboard          - content counts and recent activity
//! - POST /api/v1/admin/uploads            - raw image upload

use bson::doc;
use http_body_util::{BodyExt, Limited};
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{client_ip, extract_token, Claims, Session};
use crate::db::schemas::{
    BlogPostDoc, ContactDoc, NotificationDoc, ProjectDoc, SkillDoc, BLOG_COLLECTION,
    CONTACT_COLLECTION, NOTIFICATION_COLLECTION, PROJECT_COLLECTION, SKILL_COLLECTION,
};
use crate::routes::respond::{
    declared_length, doc_json, json_response, ok_response, parse_json_body, BoxBody,
    StandardResponse,
};
use crate::server::AppState;
use crate::services::extension_for_content_type;
use crate::types::{ApiError, Result};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

fn auth_cookies(token: &str, session_id: &str, max_age: u64) -> [String; 2] {
    [
        format!(
            "admin_token={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            token, max_age
        ),
        format!(
            "admin_session={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            session_id, max_age
        ),
    ]
}

fn clear_cookies() -> [String; 2] {
    [
        "admin_token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".to_string(),
        "admin_session=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0".to_string(),
    ]
}

fn with_cookies(mut response: Response<BoxBody>, cookies: &[String]) -> Response<BoxBody> {
    for cookie in cookies {
        if let Ok(value) = hyper::header::HeaderValue::from_str(cookie) {
            response
                .headers_mut()
                .append(hyper::header::SET_COOKIE, value);
        }
    }
    response
}

/// POST /api/v1/admin/login
///
/// Order matters: the rate limit gate runs before credentials are looked
/// at, so a locked-out IP learns nothing about password validity. The
/// limiter keys on the socket peer address; forwarded headers are
/// client-controlled and only recorded as session metadata.
pub async fn login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
    peer: SocketAddr,
) -> Result<Response<BoxBody>> {
    let peer_ip = peer.ip();
    let reported_ip = client_ip(&req, peer);
    let user_agent = req
        .headers()
        .get(hyper::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();

    let body: LoginRequest = parse_json_body(req).await?;

    state.auth.attempts.check(peer_ip)?;

    if !state.auth.credentials.verify(&body.username, &body.password)? {
        let failures = state.auth.attempts.record_failure(peer_ip);
        warn!(%peer_ip, failures, "Failed admin login attempt");
        return Err(ApiError::InvalidCredentials);
    }

    state.auth.attempts.clear(peer_ip);

    let session_id = Uuid::new_v4().to_string();
    let session = Session::new(body.username.clone(), reported_ip.to_string(), user_agent);
    let login_time = session.login_time;
    state.auth.sessions.create(session_id.clone(), session);

    let issued = state
        .auth
        .tokens
        .issue(&body.username, Some(session_id.clone()), body.remember)?;

    info!(user = %body.username, %peer_ip, remember = body.remember, "Admin login successful");

    let response = ok_response(&json!({
        "success": true,
        "message": "Login successful",
        "token": issued.token,
        "expires_in": issued.expires_in,
        "user": {
            "username": body.username,
            "role": "admin",
            "session_id": session_id,
            "login_time": login_time.to_rfc3339(),
        },
    }));

    Ok(with_cookies(
        response,
        &auth_cookies(&issued.token, &session_id, issued.expires_in),
    ))
}

/// POST /api/v1/admin/logout
///
/// Permissive by design: succeeds and clears cookies even when the token is
/// missing, expired, or garbage. Only a token that actually verifies gets
/// revoked and its session removed.
pub async fn logout(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let mut username = None;
    let mut session_cleared = false;

    if let Some(token) = extract_token(&req) {
        if let Ok(claims) = state.auth.tokens.verify(&token) {
            state.auth.revoked.revoke(token);
            if let Some(session_id) = claims.session_id {
                session_cleared = state.auth.sessions.remove(&session_id).is_some();
            }
            info!(user = %claims.sub, "Admin logged out");
            username = Some(claims.sub);
        }
    }

    let response = ok_response(&StandardResponse {
        success: true,
        message: "Logged out successfully".to_string(),
        data: Some(json!({
            "username": username,
            "session_cleared": session_cleared,
        })),
    });

    Ok(with_cookies(response, &clear_cookies()))
}

/// GET /api/v1/admin/profile
pub async fn profile(claims: &Claims, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let session = claims
        .session_id
        .as_deref()
        .and_then(|id| state.auth.sessions.get(id));

    Ok(ok_response(&json!({
        "success": true,
        "data": {
            "username": claims.sub,
            "role": "admin",
            "session_id": claims.session_id,
            "login_time": session.map(|s| s.login_time.to_rfc3339()),
            "token_issued_at": claims.iat,
            "token_expires_at": claims.exp,
        },
    })))
}

/// GET /api/v1/admin/security-status
pub async fn security_status(claims: &Claims, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let sessions: Vec<_> = state
        .auth
        .sessions
        .list_by_user(&claims.sub)
        .into_iter()
        .map(|(id, s)| {
            json!({
                "session_id": id,
                "ip_address": s.ip_address,
                "user_agent": s.user_agent,
                "login_time": s.login_time.to_rfc3339(),
                "current": claims.session_id.as_deref() == Some(id.as_str()),
            })
        })
        .collect();

    Ok(ok_response(&json!({
        "success": true,
        "data": {
            "active_sessions": sessions.len(),
            "sessions": sessions,
            "locked_out_ips": state.auth.attempts.tracked_ips(),
            "revoked_tokens": state.auth.revoked.len(),
            "token": {
                "issued_at": claims.iat,
                "expires_at": claims.exp,
                "jti": claims.jti,
            },
        },
    })))
}

/// POST /api/v1/admin/terminate-session/{id}
///
/// Only the caller's own sessions are eligible; anything else is a no-op
/// reported as not terminated.
pub async fn terminate_session(
    claims: &Claims,
    session_id: &str,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let owned = state
        .auth
        .sessions
        .get(session_id)
        .map(|s| s.username == claims.sub)
        .unwrap_or(false);

    let terminated = owned && state.auth.sessions.remove(session_id).is_some();
    if terminated {
        info!(user = %claims.sub, session_id, "Session terminated");
    }

    Ok(ok_response(&StandardResponse {
        success: true,
        message: if terminated {
            "Session terminated".to_string()
        } else {
            "Session not found".to_string()
        },
        data: Some(json!({ "terminated": terminated })),
    }))
}

/// POST /api/v1/admin/emergency-lockdown
///
/// Kills every session of the caller's account except the one making the
/// request, so a compromised credential can be cut off without locking the
/// real admin out.
pub async fn emergency_lockdown(claims: &Claims, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let current = claims
        .session_id
        .as_deref()
        .ok_or_else(|| ApiError::InvalidToken("token has no session".to_string()))?;

    let terminated = state.auth.sessions.remove_others(&claims.sub, current);

    warn!(
        user = %claims.sub,
        terminated = terminated.len(),
        "Emergency lockdown activated"
    );

    Ok(ok_response(&StandardResponse {
        success: true,
        message: format!(
            "Emergency lockdown: {} session(s) terminated",
            terminated.len()
        ),
        data: Some(json!({
            "terminated_sessions": terminated.len(),
            "remaining_sessions": 1,
        })),
    }))
}

/// POST /api/v1/admin/reset-security
///
/// Clears rate-limit records and the revocation list. Active sessions are
/// left alone.
pub async fn reset_security(claims: &Claims, state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let cleared_ips = state.auth.attempts.tracked_ips();
    let cleared_tokens = state.auth.revoked.len();

    state.auth.attempts.clear_all();
    state.auth.revoked.clear();

    info!(user = %claims.sub, cleared_ips, cleared_tokens, "Security state reset");

    Ok(ok_response(&StandardResponse {
        success: true,
        message: "Security state reset".to_string(),
        data: Some(json!({
            "cleared_ips": cleared_ips,
            "cleared_tokens": cleared_tokens,
        })),
    }))
}

/// GET /api/v1/admin/dashboard
pub async fn dashboard(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let projects = state
        .mongo
        .collection::<ProjectDoc>(PROJECT_COLLECTION)
        .await?;
    let skills = state.mongo.collection::<SkillDoc>(SKILL_COLLECTION).await?;
    let contacts = state
        .mongo
        .collection::<ContactDoc>(CONTACT_COLLECTION)
        .await?;
    let posts = state
        .mongo
        .collection::<BlogPostDoc>(BLOG_COLLECTION)
        .await?;
    let notifications = state
        .mongo
        .collection::<NotificationDoc>(NOTIFICATION_COLLECTION)
        .await?;

    let recent_contacts = contacts
        .find_page(doc! {}, doc! { "metadata.created_at": -1 }, 0, 5)
        .await?;
    let recent_projects = projects
        .find_page(doc! {}, doc! { "metadata.created_at": -1 }, 0, 5)
        .await?;

    Ok(ok_response(&json!({
        "success": true,
        "data": {
            "counts": {
                "projects": projects.count(doc! {}).await?,
                "skills": skills.count(doc! {}).await?,
                "new_contacts": contacts.count(doc! { "status": "new" }).await?,
                "published_posts": posts.count(doc! { "status": "published" }).await?,
                "draft_posts": posts.count(doc! { "status": "draft" }).await?,
                "unread_notifications": notifications.count(doc! { "read": false }).await?,
            },
            "recent_contacts": recent_contacts.iter().map(doc_json).collect::<Vec<_>>(),
            "recent_projects": recent_projects.iter().map(doc_json).collect::<Vec<_>>(),
            "active_sessions": state.auth.sessions.len(),
        },
    })))
}

/// POST /api/v1/admin/uploads
///
/// Raw image body with the type taken from Content-Type. The stored name is
/// random hex, so uploads never collide.
pub async fn upload(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Result<Response<BoxBody>> {
    let content_type = req
        .headers()
        .get(hyper::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_string())
        .ok_or_else(|| ApiError::BadRequest("Content-Type header is required".to_string()))?;

    let extension = extension_for_content_type(&content_type).ok_or_else(|| {
        ApiError::BadRequest(format!("Unsupported content type '{}'", content_type))
    })?;

    // Oversized uploads are refused before buffering: the declared length
    // first, then a cap on the stream itself.
    let limit = state.args.max_upload_bytes;
    if declared_length(&req).is_some_and(|len| len > limit as u64) {
        return Err(ApiError::BadRequest(format!(
            "Upload exceeds maximum size of {} bytes",
            limit
        )));
    }

    let body = Limited::new(req.into_body(), limit)
        .collect()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read body: {}", e)))?
        .to_bytes();

    if body.is_empty() {
        return Err(ApiError::BadRequest("Empty upload".to_string()));
    }

    let url = state.files.save(&body, extension).await?;

    info!(%url, bytes = body.len(), "File uploaded");

    Ok(json_response(
        StatusCode::CREATED,
        &StandardResponse {
            success: true,
            message: "File uploaded successfully".to_string(),
            data: Some(json!({ "url": url })),
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_cookies_are_httponly_and_scoped() {
        let [token_cookie, session_cookie] = auth_cookies("tok", "sid", 1800);
        for cookie in [&token_cookie, &session_cookie] {
            assert!(cookie.contains("HttpOnly"));
            assert!(cookie.contains("SameSite=Lax"));
            assert!(cookie.contains("Path=/"));
            assert!(cookie.contains("Max-Age=1800"));
        }
        assert!(token_cookie.starts_with("admin_token=tok"));
        assert!(session_cookie.starts_with("admin_session=sid"));
    }

    #[test]
    fn test_clear_cookies_expire_immediately() {
        for cookie in clear_cookies() {
            assert!(cookie.contains("Max-Age=0"));
        }
    }

    #[test]
    fn test_with_cookies_appends_set_cookie_headers() {
        let response = ok_response(&json!({"ok": true}));
        let response = with_cookies(response, &clear_cookies());
        let cookies: Vec<_> = response
            .headers()
            .get_all(hyper::header::SET_COOKIE)
            .iter()
            .collect();
        assert_eq!(cookies.len(), 2);
    }
}
