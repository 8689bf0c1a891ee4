//! Backend Error Module
//!
//! Error types returned by handlers and core components, and their
//! conversion into HTTP responses.
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports
//! ├── types.rs      - BackendError and status mapping
//! └── conversion.rs - IntoResponse and collaborator error conversions
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

pub use types::BackendError;
