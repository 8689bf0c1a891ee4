//! Middleware Module
//!
//! HTTP middleware for the backend server.
//!
//! - **`auth`** - Bearer token validation for the REST routes
//! - **`http_metrics`** - Request counter and latency histogram

pub mod auth;

pub mod http_metrics;

pub use auth::{auth_middleware, bearer_token, AuthUser, AuthenticatedUser};
pub use http_metrics::track_http;
