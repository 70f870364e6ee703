//! HTTP API layer for Noxa.
//!
//! This crate exposes the publication platform over JSON:
//!
//! - **Endpoints**: registration, catalog, collections, discussions,
//!   notifications and search
//! - **Extractors**: session users, JSON-or-form bodies, multipart uploads
//! - **Middleware**: session resolution from cookie or bearer token
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use endpoints::router;
pub use middleware::{AppState, SESSION_COOKIE, auth_middleware};
