/**
 * Broadcast Engine
 *
 * Delivers a wire event to every connection attached to a room.
 *
 * # Delivery
 *
 * The event is serialized once and written to a snapshot of the room's
 * listeners concurrently. `publish` returns after every write has finished
 * or failed, so two publishes issued one after another reach each
 * connection in that order.
 *
 * # Failures
 *
 * A failed or timed-out write detaches that connection from the registry,
 * emits a `ws_error` lifecycle event and closes it. Closing ends the
 * session that owns the socket, which then emits `ws_disconnect`. Other deliveries are
 * unaffected and nothing is reported to the caller beyond the counts in
 * `DeliveryReport`.
 */

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Utf8Bytes;
use futures_util::future::join_all;

use crate::backend::realtime::connection::{Connection, TransportError};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::telemetry::events::{publish_lifecycle, LifecycleEvent};
use crate::backend::telemetry::sink::EventSink;
use crate::shared::event::WireEvent;
use crate::shared::models::RoomKey;

/// Outcome of one publish
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    /// Connections that accepted the frame
    pub delivered: usize,
    /// Connections removed because their write failed
    pub pruned: usize,
}

#[derive(Clone)]
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    telemetry: Arc<dyn EventSink>,
    write_timeout: Duration,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        telemetry: Arc<dyn EventSink>,
        write_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            telemetry,
            write_timeout,
        }
    }

    /// Send `event` to every listener of `room`
    pub async fn publish(&self, room: RoomKey, event: &WireEvent) -> DeliveryReport {
        let listeners = self.registry.listeners(room);
        if listeners.is_empty() {
            tracing::debug!("[Realtime] no listeners in {} for {}", room, event.kind());
            return DeliveryReport::default();
        }

        let frame: Utf8Bytes = match serde_json::to_string(event) {
            Ok(json) => json.into(),
            Err(e) => {
                tracing::error!("[Realtime] failed to serialize {} event: {}", event.kind(), e);
                return DeliveryReport::default();
            }
        };

        let writes = listeners.iter().map(|conn| {
            let frame = frame.clone();
            async move { (conn, conn.send_text(frame, self.write_timeout).await) }
        });

        let mut report = DeliveryReport::default();
        for (conn, result) in join_all(writes).await {
            match result {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    self.prune(room, conn, &err).await;
                    report.pruned += 1;
                }
            }
        }

        tracing::info!(
            "[Realtime] {} event to {}: {} delivered, {} pruned",
            event.kind(),
            room,
            report.delivered,
            report.pruned
        );
        report
    }

    async fn prune(&self, room: RoomKey, conn: &Arc<Connection>, err: &TransportError) {
        tracing::warn!("[Realtime] dropping {} from {}: {}", conn.id(), room, err);
        self.registry.detach(room, conn.id());
        publish_lifecycle(
            self.telemetry.as_ref(),
            room,
            conn.info(),
            LifecycleEvent::Error,
            &err.to_string(),
        );
        // Wakes the owning session, which reports the disconnect
        conn.close().await;
    }
}
