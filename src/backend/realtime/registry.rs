/**
 * Connection Registry
 *
 * Maps each room to the connections currently attached to it. A single
 * `RwLock` guards the map and is held only for bookkeeping; callers get
 * snapshots and do their I/O after the lock is released.
 *
 * Rooms are created on first attach and removed when their last
 * connection detaches. The `chat_ws_active_connections` gauge moves with
 * every attach and every detach that actually removed a connection.
 */

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::backend::realtime::connection::Connection;
use crate::backend::telemetry::metrics;
use crate::shared::models::RoomKey;

type Room = HashMap<String, Arc<Connection>>;

#[derive(Default)]
pub struct ConnectionRegistry {
    rooms: RwLock<HashMap<RoomKey, Room>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, room: RoomKey, connection: Arc<Connection>) {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let listeners = rooms.entry(room).or_default();
        if listeners.insert(connection.id().to_string(), connection).is_none() {
            metrics::ws_connection_opened(room.kind);
        }
        tracing::debug!("[Realtime] attached to {} ({} listeners)", room, listeners.len());
    }

    /// Remove a connection. Returns it if it was still attached.
    pub fn detach(&self, room: RoomKey, conn_id: &str) -> Option<Arc<Connection>> {
        let mut rooms = self.rooms.write().unwrap_or_else(PoisonError::into_inner);
        let listeners = rooms.get_mut(&room)?;
        let removed = listeners.remove(conn_id);
        if listeners.is_empty() {
            rooms.remove(&room);
        }
        if removed.is_some() {
            metrics::ws_connection_closed(room.kind);
            tracing::debug!("[Realtime] detached {} from {}", conn_id, room);
        }
        removed
    }

    /// Snapshot of the room's connections
    pub fn listeners(&self, room: RoomKey) -> Vec<Arc<Connection>> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&room)
            .map(|listeners| listeners.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, room: RoomKey, conn_id: &str) -> bool {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&room)
            .is_some_and(|listeners| listeners.contains_key(conn_id))
    }

    pub fn connection_count(&self, room: RoomKey) -> usize {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&room)
            .map_or(0, HashMap::len)
    }

    /// Rooms with at least one connection
    pub fn room_count(&self) -> usize {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
