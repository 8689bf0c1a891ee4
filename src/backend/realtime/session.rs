/**
 * Session Lifecycle Manager
 *
 * Admits a WebSocket for a chat or group room and owns it until it closes.
 *
 * # Admission
 *
 * In order, each failure ending the request:
 * 1. parse the resource id (`400`)
 * 2. resolve the bearer credential from `Authorization` or `?token=` (`401`)
 * 3. check room membership; a failed lookup also counts as `403`
 * 4. complete the handshake; a rejected handshake answers with its bare
 *    status and never attaches
 *
 * # Liveness
 *
 * After attach the session only reads. Inbound frames are ignored; the
 * first close or read error ends the session, which then detaches, closes
 * the socket and emits `ws_disconnect`. Closes other than 1000 and 1001
 * emit `ws_error` before the disconnect.
 *
 * A broadcast that prunes the connection also ends the session. The
 * broadcaster has already reported that failure, so only the disconnect
 * follows.
 */

use std::sync::Arc;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use futures_util::{Sink, Stream, StreamExt};
use serde::Deserialize;

use crate::backend::auth::sessions::AuthAuthority;
use crate::backend::error::BackendError;
use crate::backend::middleware::auth::bearer_token;
use crate::backend::realtime::connection::{ConnInfo, Connection};
use crate::backend::realtime::registry::ConnectionRegistry;
use crate::backend::store::Store;
use crate::backend::telemetry::context::RequestMeta;
use crate::backend::telemetry::events::{publish_lifecycle, LifecycleEvent};
use crate::backend::telemetry::sink::EventSink;
use crate::shared::models::{RoomKey, RoomKind, UserId};

/// How a session's read loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Closure {
    /// Peer sent a close frame
    Close { code: u16, reason: String },
    /// Read error or the stream ended without a close frame
    Abnormal(String),
    /// Closed from our side after a failed write
    Dropped,
}

/// Status reported when a close frame carries no code
const NO_STATUS_RECEIVED: u16 = 1005;

impl Closure {
    fn from_frame(frame: Option<CloseFrame>) -> Self {
        match frame {
            Some(frame) => Self::Close {
                code: frame.code,
                reason: frame.reason.as_str().to_string(),
            },
            None => Self::Close {
                code: NO_STATUS_RECEIVED,
                reason: String::new(),
            },
        }
    }

    /// Normal closure or going away
    pub fn is_normal(&self) -> bool {
        matches!(
            self,
            Self::Close { code, .. } if *code == close_code::NORMAL || *code == close_code::AWAY
        )
    }

    pub fn reason(&self) -> String {
        match self {
            Self::Close { code, reason } if reason.is_empty() => format!("close {}", code),
            Self::Close { code, reason } => format!("close {}: {}", code, reason),
            Self::Abnormal(reason) => reason.clone(),
            Self::Dropped => "connection dropped after failed write".to_string(),
        }
    }

    /// Whether the session itself still owes a `ws_error`
    fn reports_error(&self) -> bool {
        !self.is_normal() && *self != Self::Dropped
    }
}

/// Read until the peer closes or the socket fails
async fn read_until_closed<St>(stream: St) -> Closure
where
    St: Stream<Item = Result<Message, axum::Error>>,
{
    let mut stream = std::pin::pin!(stream);
    loop {
        match stream.next().await {
            Some(Ok(Message::Close(frame))) => return Closure::from_frame(frame),
            Some(Ok(_)) => continue,
            Some(Err(e)) => return Closure::Abnormal(e.to_string()),
            None => return Closure::Abnormal("connection closed without close frame".to_string()),
        }
    }
}

/// Bearer credential from the `Authorization` header, else the `token` query parameter
pub fn credential(headers: &HeaderMap, query_token: Option<&str>) -> Option<String> {
    bearer_token(headers)
        .or(query_token)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn Store>,
    auth: Arc<dyn AuthAuthority>,
    registry: Arc<ConnectionRegistry>,
    telemetry: Arc<dyn EventSink>,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn Store>,
        auth: Arc<dyn AuthAuthority>,
        registry: Arc<ConnectionRegistry>,
        telemetry: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            store,
            auth,
            registry,
            telemetry,
        }
    }

    /// Run admission checks 1-3 and resolve the room and user
    pub async fn authorize(
        &self,
        kind: RoomKind,
        raw_resource_id: &str,
        credential: Option<&str>,
    ) -> Result<(RoomKey, UserId), BackendError> {
        let resource_id: i64 = raw_resource_id
            .parse()
            .map_err(|_| BackendError::bad_request(format!("invalid {} id", kind)))?;
        let room = RoomKey { kind, resource_id };

        let token = credential.ok_or_else(|| BackendError::unauthorized("missing token"))?;
        let user_id = self.auth.validate_token(token).await.map_err(|e| {
            tracing::warn!("[Realtime] token rejected for {}: {}", room, e);
            BackendError::unauthorized("invalid token")
        })?;

        let membership = match kind {
            RoomKind::Chat => self.store.is_participant(resource_id, user_id).await,
            RoomKind::Group => self.store.is_member(resource_id, user_id).await,
        };
        match membership {
            Ok(true) => Ok((room, user_id)),
            Ok(false) => Err(BackendError::forbidden(format!("not a {} member", kind))),
            Err(e) => {
                tracing::warn!("[Realtime] membership lookup failed for {}: {}", room, e);
                Err(BackendError::forbidden(format!("not a {} member", kind)))
            }
        }
    }

    /// Admit the request and hand the upgraded socket to `run`
    pub async fn open(
        &self,
        kind: RoomKind,
        raw_resource_id: &str,
        credential: Option<String>,
        meta: RequestMeta,
        upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    ) -> Response {
        let (room, user_id) = match self.authorize(kind, raw_resource_id, credential.as_deref()).await {
            Ok(admitted) => admitted,
            Err(e) => {
                tracing::debug!("[Realtime] refused {} socket {}: {}", kind, raw_resource_id, e);
                return e.into_response();
            }
        };

        let upgrade = match upgrade {
            Ok(upgrade) => upgrade,
            Err(rejection) => {
                tracing::warn!("[Realtime] upgrade failed for {}: {}", room, rejection.body_text());
                return rejection.status().into_response();
            }
        };

        let manager = self.clone();
        upgrade
            .on_failed_upgrade(move |e| {
                tracing::warn!("[Realtime] websocket handshake failed for {}: {}", room, e);
            })
            .on_upgrade(move |socket: WebSocket| async move {
                let (sink, stream) = socket.split();
                manager.serve(room, user_id, &meta, sink, stream).await;
            })
    }

    /// Attach, wait for the socket to close, detach
    pub async fn serve<Si, St>(
        &self,
        room: RoomKey,
        user_id: UserId,
        meta: &RequestMeta,
        sink: Si,
        stream: St,
    ) -> Closure
    where
        Si: Sink<Message, Error = axum::Error> + Send + 'static,
        St: Stream<Item = Result<Message, axum::Error>>,
    {
        let info = ConnInfo::new(user_id, meta);
        let conn = Arc::new(Connection::new(info.clone(), sink));

        self.registry.attach(room, conn.clone());
        publish_lifecycle(self.telemetry.as_ref(), room, &info, LifecycleEvent::Connect, "");
        tracing::info!("[Realtime] user {} connected to {} as {}", user_id, room, info.conn_id);

        let closure = tokio::select! {
            closure = read_until_closed(stream) => closure,
            _ = conn.closed() => Closure::Dropped,
        };

        self.registry.detach(room, conn.id());
        conn.close().await;

        let reason = closure.reason();
        if closure.reports_error() {
            publish_lifecycle(self.telemetry.as_ref(), room, &info, LifecycleEvent::Error, &reason);
        }
        publish_lifecycle(self.telemetry.as_ref(), room, &info, LifecycleEvent::Disconnect, &reason);
        tracing::info!(
            "[Realtime] {} left {} after {}ms ({})",
            info.conn_id,
            room,
            info.duration_ms(),
            reason
        );
        closure
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SocketQuery {
    pub token: Option<String>,
}

/// `GET /ws/chats/{chat_id}`
pub async fn chat_socket(
    State(sessions): State<SessionManager>,
    Path(chat_id): Path<String>,
    Query(query): Query<SocketQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let credential = credential(&headers, query.token.as_deref());
    let meta = RequestMeta::from_headers(&headers);
    sessions.open(RoomKind::Chat, &chat_id, credential, meta, upgrade).await
}

/// `GET /ws/groups/{group_id}`
pub async fn group_socket(
    State(sessions): State<SessionManager>,
    Path(group_id): Path<String>,
    Query(query): Query<SocketQuery>,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    let credential = credential(&headers, query.token.as_deref());
    let meta = RequestMeta::from_headers(&headers);
    sessions.open(RoomKind::Group, &group_id, credential, meta, upgrade).await
}
