//! Private Chat Module
//!
//! REST endpoints for one-to-one chats between friends.

pub mod handlers;

pub use handlers::parse_id;
