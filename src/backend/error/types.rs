/**
 * Backend Error Types
 *
 * Errors raised by HTTP handlers, the session lifecycle manager and the
 * event coordinator. Every variant maps to one HTTP status.
 *
 * # Status Mapping
 *
 * - `BadRequest` - 400
 * - `Unauthorized` - 401
 * - `Forbidden` - 403
 * - `NotFound` - 404
 * - `Storage` - 500
 * - `Transport` - 500 (logged by the broadcast engine, never returned by it)
 * - `Upstream` - 502 (user directory unavailable)
 * - `SharedError` - 400, raised by domain validation
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use chatline::backend::error::BackendError;
///
/// let err = BackendError::forbidden("not a chat member");
/// assert_eq!(err.status_code().as_u16(), 403);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Malformed input: unparseable ids, bodies, or a message outside its room
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Missing or rejected credential
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Authenticated but not allowed to act on this resource
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Persistence failure
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Write to a live connection failed
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The user directory could not be reached or answered badly
    #[error("Upstream error: {message}")]
    Upstream { message: String },

    /// Domain validation error
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized { message: message.into() }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden { message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound { message: message.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage { message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport { message: message.into() }
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream { message: message.into() }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Storage { .. } | Self::Transport { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Upstream { .. } => StatusCode::BAD_GATEWAY,
            Self::SharedError(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Human-readable message sent to clients
    pub fn message(&self) -> String {
        match self {
            Self::BadRequest { message }
            | Self::Unauthorized { message }
            | Self::Forbidden { message }
            | Self::NotFound { message }
            | Self::Storage { message }
            | Self::Transport { message }
            | Self::Upstream { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}
