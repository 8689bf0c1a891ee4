//! Chat Handlers Module
//!
//! Axum handlers for the private chat endpoints.
//!
//! - **`chats`** - listing, starting and hiding chats
//! - **`messages`** - listing, sending and deleting chat messages
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and path id parsing
//! ├── chats.rs    - GET /chats, POST /chats/start, DELETE /chats/{id}/me
//! └── messages.rs - /chats/{id}/messages endpoints
//! ```
//!
//! Every handler runs behind `auth_middleware` and takes the caller from
//! the `AuthUser` extractor.

pub mod chats;
pub mod messages;

pub use chats::{delete_chat_for_me, list_chats, start_chat};
pub use messages::{delete_message_for_all, delete_message_for_me, get_chat_messages, post_chat_message};

use crate::backend::error::BackendError;

/// Parse a numeric path segment, naming it in the error
pub fn parse_id(raw: &str, what: &str) -> Result<i64, BackendError> {
    raw.parse()
        .map_err(|_| BackendError::bad_request(format!("invalid {} id", what)))
}
