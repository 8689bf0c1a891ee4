//! Visibility Store
//!
//! Persistence interface for chats, messages, groups and the per-viewer
//! visibility flags. Handlers and the event coordinator only see these
//! traits; `PgStore` backs them with PostgreSQL and `MemoryStore` keeps
//! everything in process.
//!
//! # Invariants
//!
//! - at most one chat per unordered user pair, stored as `(low, high)`
//! - visibility flags only move from unset to set
//! - `delete_for_all` is restricted to the original sender at the query level
//! - a group's owner is always a member; members are deduplicated
//! - message listings are ascending by creation time, ties broken by id

use async_trait::async_trait;
use thiserror::Error;

use crate::shared::models::{
    Chat, ChatSummary, Group, GroupMessage, Message, Side, UserId,
};

/// PostgreSQL store
pub mod postgres;

/// In-process store
pub mod memory;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// No row matched (missing record, or a guarded update touched zero rows)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Input the store refuses to persist
    #[error("invalid input: {0}")]
    Invalid(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Return the chat for this pair, creating it if needed, and unhide it
    /// for both participants. Fails with `Invalid` when `a == b`.
    async fn create_or_get_chat(&self, a: UserId, b: UserId) -> Result<Chat, StoreError>;

    async fn get_chat(&self, chat_id: i64) -> Result<Option<Chat>, StoreError>;

    async fn is_participant(&self, chat_id: i64, user_id: UserId) -> Result<bool, StoreError>;

    /// Chats not hidden by `user_id`, newest first
    async fn list_chats(&self, user_id: UserId) -> Result<Vec<ChatSummary>, StoreError>;

    async fn hide_chat_for_user(&self, chat_id: i64, user_id: UserId) -> Result<(), StoreError>;

    async fn unhide_chat_for_user(&self, chat_id: i64, user_id: UserId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create_chat_message(
        &self,
        chat_id: i64,
        sender_id: UserId,
        content: &str,
    ) -> Result<Message, StoreError>;

    /// Messages of the chat visible to `viewer`, ascending
    async fn chat_messages_for_user(
        &self,
        chat_id: i64,
        viewer: UserId,
    ) -> Result<Vec<Message>, StoreError>;

    async fn get_message(&self, message_id: i64) -> Result<Option<Message>, StoreError>;

    /// Set the hidden flag for one side. `NotFound` when no row matched.
    async fn soft_delete_for_user(&self, message_id: i64, side: Side) -> Result<(), StoreError>;

    /// Terminal delete, only when `sender_id` sent the message.
    /// `NotFound` when no row matched.
    async fn delete_for_all(&self, message_id: i64, sender_id: UserId) -> Result<(), StoreError>;
}

#[async_trait]
pub trait GroupStore: Send + Sync {
    /// Create the group and its memberships atomically. The owner is always
    /// added; duplicate member ids collapse.
    async fn create_group(
        &self,
        owner_id: UserId,
        name: &str,
        member_ids: &[UserId],
    ) -> Result<Group, StoreError>;

    async fn list_groups_for_user(&self, user_id: UserId) -> Result<Vec<Group>, StoreError>;

    async fn is_member(&self, group_id: i64, user_id: UserId) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait GroupMessageStore: Send + Sync {
    async fn create_group_message(
        &self,
        group_id: i64,
        sender_id: UserId,
        content: &str,
    ) -> Result<GroupMessage, StoreError>;

    /// Messages not deleted for all, ascending
    async fn group_messages(&self, group_id: i64) -> Result<Vec<GroupMessage>, StoreError>;

    async fn get_group_message(&self, message_id: i64) -> Result<Option<GroupMessage>, StoreError>;

    /// Terminal delete, only when `sender_id` sent the message.
    /// `NotFound` when no row matched.
    async fn delete_group_message_for_all(
        &self,
        message_id: i64,
        sender_id: UserId,
    ) -> Result<(), StoreError>;
}

/// Everything the service persists
pub trait Store: ChatStore + MessageStore + GroupStore + GroupMessageStore {}

impl<T> Store for T where T: ChatStore + MessageStore + GroupStore + GroupMessageStore {}
