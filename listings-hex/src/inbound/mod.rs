//! HTTP Inbound Adapter
//!
//! Axum-based HTTP server that drives the application layer.

mod auth;
pub mod handlers;
mod server;

pub use auth::hash_admin_key;
pub use server::HttpServer;
