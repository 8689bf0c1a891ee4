//! Shared Error Types
//!
//! Errors raised by the domain types in `shared`, independent of any
//! transport. The backend wraps these in `BackendError`.
//!
//! # Usage
//!
//! ```rust
//! use chatline::shared::error::SharedError;
//!
//! let error = SharedError::validation("content", "message content cannot be empty");
//! ```
use thiserror::Error;

/// Errors produced by shared domain types
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// Data validation error
    #[error("{message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
