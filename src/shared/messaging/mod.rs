//! Messaging API Types
//!
//! Request and response bodies of the REST endpoints:
//!
//! - `chat` - private chat endpoints
//! - `group` - group endpoints
//!
//! # Usage
//!
//! ```rust
//! use chatline::shared::messaging::{SendMessageRequest, StartChatRequest};
//! ```

pub mod chat;
pub mod group;

pub use chat::{
    ListChatsResponse, ListMessagesResponse, SendMessageRequest, StartChatRequest,
    StartChatResponse,
};
pub use group::{CreateGroupRequest, CreateGroupResponse, ListGroupsResponse};
