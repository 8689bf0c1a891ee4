/**
 * Live Connection
 *
 * One attached WebSocket: its metadata and the write half of the socket.
 *
 * # Write Serialization
 *
 * The sink sits behind an async mutex, so at most one write is in flight
 * per connection and frames leave in the order their writers acquired the
 * lock. Every write is bounded by a timeout; a write that exceeds it is a
 * transport failure.
 *
 * # Teardown
 *
 * `close` cancels the connection's token before it tries the close frame.
 * The session owning the read half waits on `closed()`, so a connection
 * pruned by a broadcast ends its session even when the peer never answers.
 */

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use axum::extract::ws::{Message, Utf8Bytes};
use chrono::{DateTime, Utc};
use futures_util::{Sink, SinkExt};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::backend::telemetry::context::RequestMeta;
use crate::shared::models::UserId;

/// Time allowed for the close handshake frame when tearing a connection down
const CLOSE_GRACE: Duration = Duration::from_secs(1);

/// Write half of a socket
pub type WsSink = Pin<Box<dyn Sink<Message, Error = axum::Error> + Send>>;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection closed")]
    Closed,

    #[error("write timed out after {0:?}")]
    Timeout(Duration),

    #[error("write failed: {0}")]
    Write(#[from] axum::Error),
}

/// Per-connection metadata, fixed at attach time
#[derive(Debug, Clone)]
pub struct ConnInfo {
    /// 32 lowercase hex characters
    pub conn_id: String,
    pub user_id: UserId,
    pub device_id: String,
    pub ip: String,
    pub request_id: String,
    pub trace_id: String,
    pub attached_at: DateTime<Utc>,
    started: Instant,
}

impl ConnInfo {
    pub fn new(user_id: UserId, meta: &RequestMeta) -> Self {
        Self {
            conn_id: Uuid::new_v4().simple().to_string(),
            user_id,
            device_id: meta.device_id.clone(),
            ip: meta.ip.clone(),
            request_id: meta.request_id.clone(),
            trace_id: meta.trace_id.clone(),
            attached_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Milliseconds since attach
    pub fn duration_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }
}

pub struct Connection {
    info: ConnInfo,
    sink: Mutex<WsSink>,
    closed: AtomicBool,
    cancel: CancellationToken,
}

impl Connection {
    pub fn new<S>(info: ConnInfo, sink: S) -> Self
    where
        S: Sink<Message, Error = axum::Error> + Send + 'static,
    {
        Self {
            info,
            sink: Mutex::new(Box::pin(sink)),
            closed: AtomicBool::new(false),
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.info.conn_id
    }

    pub fn info(&self) -> &ConnInfo {
        &self.info
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Write one text frame, waiting at most `write_timeout` for the socket
    pub async fn send_text(
        &self,
        text: Utf8Bytes,
        write_timeout: Duration,
    ) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut sink = self.sink.lock().await;
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        match tokio::time::timeout(write_timeout, sink.send(Message::Text(text))).await {
            Ok(result) => result.map_err(TransportError::from),
            Err(_) => Err(TransportError::Timeout(write_timeout)),
        }
    }

    /// Resolves once `close` has been called
    pub async fn closed(&self) {
        self.cancel.cancelled().await
    }

    /// Mark closed, wake the owning session and attempt a close frame. Idempotent.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.cancel.cancel();
        let shutdown = async {
            let mut sink = self.sink.lock().await;
            let _ = sink.send(Message::Close(None)).await;
            let _ = sink.close().await;
        };
        if tokio::time::timeout(CLOSE_GRACE, shutdown).await.is_err() {
            tracing::debug!("[Realtime] close handshake timed out for {}", self.info.conn_id);
        }
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("info", &self.info)
            .field("closed", &self.is_closed())
            .finish()
    }
}
