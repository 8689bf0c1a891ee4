//! Shared Module
//!
//! Domain types used by every backend component: rooms, chats, groups,
//! messages with their visibility state, the realtime wire events and the
//! REST request and response bodies.

/// Chat domain models and the visibility state machine
pub mod models;

/// Realtime wire events
pub mod event;

/// Shared error types
pub mod error;

/// REST request and response bodies
pub mod messaging;

pub use error::SharedError;
pub use event::WireEvent;
pub use models::{
    canonical_pair, Chat, ChatSummary, Group, GroupMessage, Lifecycle, Message, RoomKey, RoomKind,
    RoomMessage, Side, UserId, UserProfile, Visibility, VisibilityFlags, WithSender,
};
