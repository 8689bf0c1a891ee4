/**
 * Chat Domain Models
 *
 * Rooms, chats, groups and messages as they are stored and as they travel
 * over the wire. All identifiers are 64-bit integers assigned by the store.
 *
 * # Visibility
 *
 * A private message carries a `Visibility`: a lifecycle (`Active` or the
 * terminal `DeletedForAll`) plus a per-side hidden bitset. On the wire the
 * three legacy booleans `deleted_by_sender`, `deleted_by_receiver` and
 * `deleted_for_all` are kept so existing clients keep working.
 *
 * Group messages only have the lifecycle, serialized as `deleted_for_all`.
 */

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;

/// User identifier issued by the user service
pub type UserId = i64;

/// Which namespace a room lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    /// One-to-one private chat
    Chat,
    /// Multi-member group
    Group,
}

impl RoomKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for RoomKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a realtime room: a chat or a group id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomKey {
    pub kind: RoomKind,
    pub resource_id: i64,
}

impl RoomKey {
    pub fn chat(chat_id: i64) -> Self {
        Self { kind: RoomKind::Chat, resource_id: chat_id }
    }

    pub fn group(group_id: i64) -> Self {
        Self { kind: RoomKind::Group, resource_id: group_id }
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.resource_id)
    }
}

/// Side of a private conversation relative to a message's sender
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Sender,
    Receiver,
}

impl Side {
    /// The side `actor` occupies for a message sent by `sender`
    pub fn for_actor(actor: UserId, sender: UserId) -> Self {
        if actor == sender {
            Self::Sender
        } else {
            Self::Receiver
        }
    }

    fn bit(self) -> u8 {
        match self {
            Self::Sender => 0b01,
            Self::Receiver => 0b10,
        }
    }
}

/// Message lifecycle. `DeletedForAll` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "bool", into = "bool")]
pub enum Lifecycle {
    #[default]
    Active,
    DeletedForAll,
}

impl From<bool> for Lifecycle {
    fn from(deleted_for_all: bool) -> Self {
        if deleted_for_all {
            Self::DeletedForAll
        } else {
            Self::Active
        }
    }
}

impl From<Lifecycle> for bool {
    fn from(lifecycle: Lifecycle) -> Self {
        lifecycle == Lifecycle::DeletedForAll
    }
}

/// Wire and row representation of a private message's visibility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VisibilityFlags {
    #[serde(default)]
    pub deleted_by_sender: bool,
    #[serde(default)]
    pub deleted_by_receiver: bool,
    #[serde(default)]
    pub deleted_for_all: bool,
}

/// Per-viewer visibility of a private message
///
/// Flags only ever move from unset to set. Once the lifecycle reaches
/// `DeletedForAll` the message is invisible to everyone regardless of the
/// per-side bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "VisibilityFlags", into = "VisibilityFlags")]
pub struct Visibility {
    lifecycle: Lifecycle,
    hidden: u8,
}

impl Visibility {
    /// Fresh message, visible to both sides
    pub fn active() -> Self {
        Self::default()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_deleted_for_all(&self) -> bool {
        self.lifecycle == Lifecycle::DeletedForAll
    }

    pub fn is_hidden_for(&self, side: Side) -> bool {
        self.hidden & side.bit() != 0
    }

    /// Soft delete for one side. Idempotent.
    pub fn hide_for(&mut self, side: Side) {
        self.hidden |= side.bit();
    }

    /// Terminal transition. Idempotent.
    pub fn delete_for_all(&mut self) {
        self.lifecycle = Lifecycle::DeletedForAll;
    }

    /// Whether `viewer` may see a message sent by `sender`
    pub fn visible_to(&self, viewer: UserId, sender: UserId) -> bool {
        !self.is_deleted_for_all() && !self.is_hidden_for(Side::for_actor(viewer, sender))
    }

    pub fn flags(&self) -> VisibilityFlags {
        VisibilityFlags {
            deleted_by_sender: self.is_hidden_for(Side::Sender),
            deleted_by_receiver: self.is_hidden_for(Side::Receiver),
            deleted_for_all: self.is_deleted_for_all(),
        }
    }
}

impl From<VisibilityFlags> for Visibility {
    fn from(flags: VisibilityFlags) -> Self {
        let mut visibility = Visibility::active();
        if flags.deleted_by_sender {
            visibility.hide_for(Side::Sender);
        }
        if flags.deleted_by_receiver {
            visibility.hide_for(Side::Receiver);
        }
        if flags.deleted_for_all {
            visibility.delete_for_all();
        }
        visibility
    }
}

impl From<Visibility> for VisibilityFlags {
    fn from(visibility: Visibility) -> Self {
        visibility.flags()
    }
}

/// Private one-to-one chat. `user1_id < user2_id` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    pub user1_id: UserId,
    pub user2_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl Chat {
    pub fn has_participant(&self, user_id: UserId) -> bool {
        self.user1_id == user_id || self.user2_id == user_id
    }

    pub fn participants(&self) -> [UserId; 2] {
        [self.user1_id, self.user2_id]
    }

    /// The participant that is not `user_id`
    pub fn other_participant(&self, user_id: UserId) -> UserId {
        if self.user1_id == user_id {
            self.user2_id
        } else {
            self.user1_id
        }
    }
}

/// Canonical (low, high) ordering of a chat pair
pub fn canonical_pair(a: UserId, b: UserId) -> (UserId, UserId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// A chat as seen from one participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSummary {
    pub chat_id: i64,
    pub friend_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_username: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Private chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub chat_id: i64,
    pub sender_id: UserId,
    pub content: String,
    #[serde(flatten)]
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn visible_to(&self, viewer: UserId) -> bool {
        self.visibility.visible_to(viewer, self.sender_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub id: i64,
    pub group_id: i64,
    pub sender_id: UserId,
    pub content: String,
    #[serde(rename = "deleted_for_all", default)]
    pub lifecycle: Lifecycle,
    pub created_at: DateTime<Utc>,
}

/// A message of either room kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RoomMessage {
    Chat(Message),
    Group(GroupMessage),
}

impl RoomMessage {
    pub fn id(&self) -> i64 {
        match self {
            Self::Chat(m) => m.id,
            Self::Group(m) => m.id,
        }
    }
}

/// Public profile returned by the user directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub username: String,
}

/// A record decorated with its sender's username for listing endpoints
#[derive(Debug, Clone, Serialize)]
pub struct WithSender<T> {
    #[serde(flatten)]
    pub inner: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender_username: Option<String>,
}

/// Reject blank message bodies
pub fn validate_content(content: &str) -> Result<&str, SharedError> {
    if content.trim().is_empty() {
        return Err(SharedError::validation("content", "message content cannot be empty"));
    }
    Ok(content)
}
