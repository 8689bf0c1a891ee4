//! Group Module
//!
//! REST endpoints for group rooms: creation, listing and group messages.

pub mod handlers;

pub use handlers::{
    create_group, delete_group_message_for_all, get_group_messages, list_groups,
    post_group_message,
};
