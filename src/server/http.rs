//! HTTP server implementation
//!
//! hyper http1 with TokioIo, a hand-rolled method/path router, and shared
//! state behind an Arc. Admin routes are gated here so handlers never see
//! an unauthenticated request.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{authenticate, AuthState};
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes::respond::{cors_preflight, error_response, full_body, BoxBody};
use crate::routes::{admin, blog, contacts, health, notifications, projects, skills};
use crate::services::{content_type_for_file, ContactNotifier, FileStore, LogNotifier};
use crate::types::{ApiError, Result};

/// Shared application state, one instance per process.
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    pub auth: AuthState,
    pub files: FileStore,
    pub notifier: Arc<dyn ContactNotifier>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(args: Args, mongo: MongoClient) -> Result<Self> {
        let auth = AuthState::from_config(&args)?;
        let files = FileStore::new(args.upload_dir.clone());

        Ok(Self {
            args,
            mongo,
            auth,
            files,
            notifier: Arc::new(LogNotifier),
            started_at: Instant::now(),
        })
    }
}

/// Start the HTTP server
pub async fn run(state: Arc<AppState>) -> Result<()> {
    state.files.ensure_root().await?;

    let listener = TcpListener::bind(state.args.listen).await?;

    info!("Portfolio API listening on {}", state.args.listen);
    if state.args.dev_mode {
        warn!("Development mode enabled - insecure defaults in effect");
    }

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let io = TokioIo::new(stream);
                let state = Arc::clone(&state);

                tokio::spawn(async move {
                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    debug!("[{}] {} {}", addr, method, path);

    if method == Method::OPTIONS {
        return Ok(cors_preflight());
    }

    let response = match route(state, addr, req, &method, &path).await {
        Ok(response) => response,
        Err(err) => {
            if err.status_code().is_server_error() {
                error!("[{}] {} {} failed: {}", addr, method, path, err);
            }
            error_response(&err)
        }
    };

    Ok(response)
}

async fn route(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
    method: &Method,
    path: &str,
) -> Result<Response<BoxBody>> {
    if let Some(rest) = path.strip_prefix("/api/v1/admin") {
        return route_admin(state, addr, req, method, rest).await;
    }

    match (method, path) {
        (&Method::GET, "/health") => health::health(state).await,

        // Public portfolio content
        (&Method::GET, "/api/v1/projects") => projects::list(req, state).await,
        (&Method::GET, "/api/v1/projects/featured") => projects::featured(req, state).await,
        (&Method::GET, p) if p.starts_with("/api/v1/projects/") => {
            let id = &p["/api/v1/projects/".len()..];
            projects::get(id, state).await
        }

        (&Method::GET, "/api/v1/skills") => skills::list(req, state).await,
        (&Method::GET, "/api/v1/skills/categories") => skills::categories().await,
        (&Method::GET, p) if p.starts_with("/api/v1/skills/") => {
            let id = &p["/api/v1/skills/".len()..];
            skills::get(id, state).await
        }

        (&Method::POST, "/api/v1/contacts") => contacts::create(req, state, addr).await,

        (&Method::GET, "/api/v1/blog/posts") => blog::list_published(req, state).await,
        (&Method::GET, "/api/v1/blog/posts/featured") => blog::featured(req, state).await,
        (&Method::GET, "/api/v1/blog/categories") => blog::categories().await,
        (&Method::GET, "/api/v1/blog/stats") => blog::stats(state).await,
        (&Method::GET, p) if p.starts_with("/api/v1/blog/posts/") => {
            let identifier = &p["/api/v1/blog/posts/".len()..];
            blog::get_published(identifier, state).await
        }

        // Uploaded files
        (&Method::GET, p) if p.starts_with("/uploads/") => {
            let name = &p["/uploads/".len()..];
            serve_upload(state, name).await
        }

        _ => Err(ApiError::NotFound(path.to_string())),
    }
}

/// Admin surface under /api/v1/admin.
///
/// Login and logout are the only ungated entry points; everything else
/// authenticates before the body is touched.
async fn route_admin(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
    method: &Method,
    rest: &str,
) -> Result<Response<BoxBody>> {
    match (method, rest) {
        (&Method::POST, "/login") => return admin::login(req, state, addr).await,
        (&Method::POST, "/logout") => return admin::logout(req, state).await,
        _ => {}
    }

    let claims = authenticate(&req, &state.auth)?;

    match (method, rest) {
        // Authentication and security
        (&Method::GET, "/profile") => admin::profile(&claims, state).await,
        (&Method::GET, "/security-status") => admin::security_status(&claims, state).await,
        (&Method::POST, p) if p.starts_with("/terminate-session/") => {
            let session_id = &p["/terminate-session/".len()..];
            admin::terminate_session(&claims, session_id, state).await
        }
        (&Method::POST, "/emergency-lockdown") => admin::emergency_lockdown(&claims, state).await,
        (&Method::POST, "/reset-security") => admin::reset_security(&claims, state).await,
        (&Method::GET, "/dashboard") => admin::dashboard(state).await,
        (&Method::POST, "/uploads") => admin::upload(req, state).await,

        // Projects
        (&Method::GET, "/projects") => projects::list(req, state).await,
        (&Method::POST, "/projects") => projects::create(req, state).await,
        (&Method::PUT, p) if p.starts_with("/projects/") => {
            let id = &p["/projects/".len()..];
            projects::update(id, req, state).await
        }
        (&Method::DELETE, p) if p.starts_with("/projects/") => {
            let id = &p["/projects/".len()..];
            projects::delete(id, state).await
        }

        // Skills
        (&Method::GET, "/skills") => skills::list(req, state).await,
        (&Method::POST, "/skills") => skills::create(req, state).await,
        (&Method::PUT, p) if p.starts_with("/skills/") => {
            let id = &p["/skills/".len()..];
            skills::update(id, req, state).await
        }
        (&Method::DELETE, p) if p.starts_with("/skills/") => {
            let id = &p["/skills/".len()..];
            skills::delete(id, state).await
        }

        // Contacts
        (&Method::GET, "/contacts") => contacts::list(req, state).await,
        (&Method::GET, p) if p.starts_with("/contacts/") => {
            let id = &p["/contacts/".len()..];
            contacts::get(id, state).await
        }
        (&Method::PUT, p) if p.starts_with("/contacts/") && p.ends_with("/status") => {
            let id = &p["/contacts/".len()..p.len() - "/status".len()];
            contacts::set_status(id, req, state).await
        }
        (&Method::DELETE, p) if p.starts_with("/contacts/") => {
            let id = &p["/contacts/".len()..];
            contacts::delete(id, state).await
        }

        // Blog
        (&Method::GET, "/blog/posts") => blog::list_all(req, state).await,
        (&Method::POST, "/blog/posts") => blog::create(req, state).await,
        (&Method::PUT, p) if p.starts_with("/blog/posts/") => {
            let id = &p["/blog/posts/".len()..];
            blog::update(id, req, state).await
        }
        (&Method::DELETE, p) if p.starts_with("/blog/posts/") => {
            let id = &p["/blog/posts/".len()..];
            blog::delete(id, state).await
        }

        // Notifications
        (&Method::GET, "/notifications") => notifications::list(req, state).await,
        (&Method::POST, "/notifications") => notifications::create(&claims, req, state).await,
        (&Method::GET, "/notifications/stats") => notifications::stats(state).await,
        (&Method::PUT, "/notifications/read-all") => notifications::mark_all_read(state).await,
        (&Method::PUT, p) if p.starts_with("/notifications/") && p.ends_with("/read") => {
            let id = &p["/notifications/".len()..p.len() - "/read".len()];
            notifications::mark_read(id, state).await
        }
        (&Method::DELETE, p) if p.starts_with("/notifications/") => {
            let id = &p["/notifications/".len()..];
            notifications::delete(id, state).await
        }

        _ => Err(ApiError::NotFound(format!("/api/v1/admin{}", rest))),
    }
}

/// Serve a previously uploaded file from disk.
async fn serve_upload(state: Arc<AppState>, name: &str) -> Result<Response<BoxBody>> {
    let data = state.files.read(name).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type_for_file(name))
        .header("Cache-Control", "public, max-age=86400")
        .body(full_body(data))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
