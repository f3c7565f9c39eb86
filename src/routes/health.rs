//! Health check endpoint
//!
//! `/health` returns 200 while the process is up; the body reports whether
//! MongoDB is currently reachable so monitors can distinguish "up" from
//! "up but degraded".

use hyper::Response;
use serde::Serialize;
use std::sync::Arc;

use crate::routes::respond::{ok_response, BoxBody};
use crate::server::AppState;
use crate::types::Result;

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
    pub uptime: u64,
    pub database: bool,
    pub timestamp: String,
}

/// GET /health
pub async fn health(state: Arc<AppState>) -> Result<Response<BoxBody>> {
    let database = state.mongo.ping().await.is_ok();

    Ok(ok_response(&HealthResponse {
        healthy: true,
        status: if database { "online" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        uptime: state.started_at.elapsed().as_secs(),
        database,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}
