//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - An in-memory application fixture and live server helper
//! - A fake user directory
//! - Token helpers
//! - Custom assertion macros

pub mod assertions;

// Re-export commonly used utilities
pub use auth_helpers::*;
pub use database::*;
pub use mock_server::*;
