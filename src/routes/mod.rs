//! HTTP routes for the portfolio API

pub mod admin;
pub mod blog;
pub mod contacts;
pub mod health;
pub mod notifications;
pub mod projects;
pub mod respond;
pub mod skills;

pub use respond::{error_response, BoxBody};
