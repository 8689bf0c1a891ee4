/**
 * Realtime Wire Events
 *
 * Events pushed to room listeners over WebSocket. The JSON shape is
 * `{"type": "message", "message": {...}}` for new messages and
 * `{"type": "delete_for_all", "message_id": 42}` for deletions.
 */
use serde::{Deserialize, Serialize};

use crate::shared::models::RoomMessage;

/// Event delivered to every connection attached to a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireEvent {
    /// A message was created in the room
    Message { message: RoomMessage },
    /// A message was deleted for everyone
    DeleteForAll { message_id: i64 },
}

impl WireEvent {
    pub fn message(message: RoomMessage) -> Self {
        Self::Message { message }
    }

    pub fn delete_for_all(message_id: i64) -> Self {
        Self::DeleteForAll { message_id }
    }

    /// Name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::DeleteForAll { .. } => "delete_for_all",
        }
    }
}
