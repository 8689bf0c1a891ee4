//! WebSocket lifecycle events
//!
//! Published on `ws_events.chats` / `ws_events.groups` for every connect,
//! disconnect and transport error, and counted in `chat_ws_events_total`.

use crate::backend::realtime::connection::ConnInfo;
use crate::backend::telemetry::metrics;
use crate::backend::telemetry::sink::{build_headers, EventEnvelope, EventSink};
use crate::shared::models::{RoomKey, RoomKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Connect,
    Disconnect,
    Error,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "ws_connect",
            Self::Disconnect => "ws_disconnect",
            Self::Error => "ws_error",
        }
    }
}

pub fn ws_routing_key(kind: RoomKind) -> &'static str {
    match kind {
        RoomKind::Chat => "ws_events.chats",
        RoomKind::Group => "ws_events.groups",
    }
}

/// Publish a lifecycle event for one connection
pub fn publish_lifecycle(
    sink: &dyn EventSink,
    room: RoomKey,
    info: &ConnInfo,
    event: LifecycleEvent,
    reason: &str,
) {
    metrics::ws_event(room.kind, event.as_str());

    let duration_ms = match event {
        LifecycleEvent::Connect => 0,
        _ => info.duration_ms(),
    };

    let payload = serde_json::json!({
        "ws": {
            "kind": room.kind.as_str(),
            "resource_id": room.resource_id,
            "event": event.as_str(),
            "conn_id": info.conn_id,
            "duration_ms": duration_ms,
            "reason": reason,
        },
        "identity": {
            "user_id": info.user_id,
            "device_id": info.device_id,
            "ip": info.ip,
        },
    });

    sink.publish(
        ws_routing_key(room.kind),
        EventEnvelope::new("ws_events", event.as_str(), payload),
        build_headers(&info.request_id, &info.trace_id),
    );
}
