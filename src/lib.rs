//! Portfolio API - REST backend for a personal portfolio site
//!
//! Serves public portfolio content (projects, skills, blog posts, contact
//! form) from MongoDB and an authenticated admin surface for managing it.
//! Admin access is a single configured account behind JWT-bound server-side
//! sessions, per-IP login rate limiting, and a token revocation list.

pub mod auth;
pub mod config;
pub mod db;
pub mod routes;
pub mod server;
pub mod services;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{ApiError, Result};
