//! WebSocket room tests

use std::net::SocketAddr;
use std::time::Duration;

use axum::http::{Method, StatusCode};
use futures_util::StreamExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{self, Message as WsMessage};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chatline::shared::models::RoomKey;

use crate::common::{bearer, token_for, TestApp};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, path: &str, user: i64) -> Client {
    let url = format!("ws://{}{}?token={}", addr, path, token_for(user));
    let (ws, _) = connect_async(url).await.expect("Failed to connect websocket");
    ws
}

/// Status of a refused handshake
async fn refused(url: String) -> u16 {
    match connect_async(url).await {
        Err(tungstenite::Error::Http(response)) => response.status().as_u16(),
        Err(e) => panic!("Expected an HTTP refusal, got {}", e),
        Ok(_) => panic!("Expected the handshake to be refused"),
    }
}

async fn next_event(ws: &mut Client) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("Timed out waiting for an event")
        .expect("Socket closed before an event arrived")
        .expect("Socket read failed");
    match frame {
        WsMessage::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("Expected text frame, got {:?}", other),
    }
}

async fn close_normally(ws: &mut Client) {
    ws.close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "bye".into(),
    }))
    .await
    .unwrap();
}

/// Poll until `count` events named `name` have been published
async fn wait_for_events(app: &TestApp, name: &str, count: usize) {
    for _ in 0..200 {
        if app.telemetry.named(name).len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("Never saw {} {} events", count, name);
}

#[tokio::test]
async fn test_chat_message_reaches_both_participants() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let addr = app.spawn().await;
    let path = format!("/ws/chats/{}", chat_id);

    let mut alice = connect(addr, &path, 1).await;
    let mut bob = connect(addr, &path, 2).await;
    app.wait_for_listeners(RoomKey::chat(chat_id), 2).await;

    let (status, sent) = app
        .post(&format!("/chats/{}/messages", chat_id), 1, json!({ "content": "ping" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    for ws in [&mut alice, &mut bob] {
        let event = next_event(ws).await;
        assert_eq!(event["type"], "message");
        assert_eq!(event["message"]["id"], sent["id"]);
        assert_eq!(event["message"]["chat_id"], chat_id);
        assert_eq!(event["message"]["content"], "ping");
    }
}

#[tokio::test]
async fn test_socket_lifecycle_reaches_metrics() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2]).await;
    let addr = app.spawn().await;

    let mut ws = connect(addr, &format!("/ws/groups/{}", group_id), 2).await;
    app.wait_for_listeners(RoomKey::group(group_id), 1).await;

    let (status, body) = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("metrics are plain text");
    assert!(text.lines().any(|line| line.starts_with("chat_ws_events_total{")
        && line.contains("kind=\"group\"")
        && line.contains("event=\"ws_connect\"")));
    assert!(text
        .lines()
        .any(|line| line.starts_with("chat_ws_active_connections{") && line.contains("kind=\"group\"")));

    close_normally(&mut ws).await;
    wait_for_events(&app, "ws_disconnect", 1).await;
}

#[tokio::test]
async fn test_delete_for_all_is_pushed() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let uri = format!("/chats/{}/messages", chat_id);
    let (_, sent) = app.post(&uri, 1, json!({ "content": "oops" })).await;

    let addr = app.spawn().await;
    let mut bob = connect(addr, &format!("/ws/chats/{}", chat_id), 2).await;
    app.wait_for_listeners(RoomKey::chat(chat_id), 1).await;

    let (status, _) = app.delete(&format!("{}/{}/all", uri, sent["id"]), 1).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let event = next_event(&mut bob).await;
    assert_eq!(event, json!({ "type": "delete_for_all", "message_id": sent["id"] }));
}

#[tokio::test]
async fn test_group_room_delivery_with_bearer_header() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2, 3]).await;
    let other_group = app.group_with(3, &[]).await;
    let addr = app.spawn().await;

    let mut request = format!("ws://{}/ws/groups/{}", addr, group_id)
        .into_client_request()
        .unwrap();
    request
        .headers_mut()
        .insert("Authorization", bearer(3).parse().unwrap());
    let (mut carol, _) = connect_async(request).await.unwrap();
    let mut elsewhere = connect(addr, &format!("/ws/groups/{}", other_group), 3).await;
    app.wait_for_listeners(RoomKey::group(group_id), 1).await;
    app.wait_for_listeners(RoomKey::group(other_group), 1).await;

    app.post(&format!("/groups/{}/messages", group_id), 2, json!({ "content": "standup" }))
        .await;

    let event = next_event(&mut carol).await;
    assert_eq!(event["type"], "message");
    assert_eq!(event["message"]["group_id"], group_id);
    assert_eq!(event["message"]["sender_id"], 2);

    let quiet = tokio::time::timeout(Duration::from_millis(200), elsewhere.next()).await;
    assert!(quiet.is_err(), "Other group should not receive the message");
}

#[tokio::test]
async fn test_admission_failures() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let addr = app.spawn().await;

    assert_eq!(
        refused(format!("ws://{}/ws/chats/abc?token={}", addr, token_for(1))).await,
        400
    );
    assert_eq!(refused(format!("ws://{}/ws/chats/{}", addr, chat_id)).await, 401);
    assert_eq!(
        refused(format!("ws://{}/ws/chats/{}?token=garbage", addr, chat_id)).await,
        401
    );
    assert_eq!(
        refused(format!("ws://{}/ws/chats/{}?token={}", addr, chat_id, token_for(3))).await,
        403
    );
    assert_eq!(
        refused(format!("ws://{}/ws/groups/{}?token={}", addr, 99, token_for(1))).await,
        403
    );

    assert_eq!(app.state.registry.room_count(), 0);
    assert!(app.telemetry.named("ws_connect").is_empty());
}

#[tokio::test]
async fn test_admitted_request_without_upgrade_gets_bare_status() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;

    let (status, body) = app
        .request(Method::GET, &format!("/ws/chats/{}", chat_id), Some(1), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, Value::Null);

    let (status, body) = app
        .request(Method::GET, "/ws/chats/nope", Some(1), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid chat id");
}

#[tokio::test]
async fn test_close_detaches_and_reports_lifecycle() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let addr = app.spawn().await;
    let room = RoomKey::chat(chat_id);

    let mut alice = connect(addr, &format!("/ws/chats/{}", chat_id), 1).await;
    app.wait_for_listeners(room, 1).await;
    close_normally(&mut alice).await;

    app.wait_for_listeners(room, 0).await;
    wait_for_events(&app, "ws_disconnect", 1).await;

    let connects = app.telemetry.named("ws_connect");
    let disconnects = app.telemetry.named("ws_disconnect");
    assert_eq!(connects.len(), 1);
    assert_eq!(disconnects.len(), 1);
    assert!(app.telemetry.named("ws_error").is_empty());

    let connect = &connects[0];
    assert_eq!(connect.routing_key, "ws_events.chats");
    assert_eq!(connect.envelope.payload["identity"]["user_id"], 1);
    assert_eq!(connect.envelope.payload["ws"]["resource_id"], chat_id);

    let disconnect = &disconnects[0];
    assert_eq!(disconnect.envelope.payload["ws"]["reason"], "close 1000: bye");
    assert_eq!(
        disconnect.envelope.payload["ws"]["conn_id"],
        connect.envelope.payload["ws"]["conn_id"]
    );
    assert_eq!(app.state.registry.room_count(), 0);
}

#[tokio::test]
async fn test_dropped_socket_reports_error() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[]).await;
    let addr = app.spawn().await;

    let alice = connect(addr, &format!("/ws/groups/{}", group_id), 1).await;
    app.wait_for_listeners(RoomKey::group(group_id), 1).await;
    drop(alice);

    wait_for_events(&app, "ws_disconnect", 1).await;
    let errors = app.telemetry.named("ws_error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].routing_key, "ws_events.groups");
    assert_eq!(app.state.registry.connection_count(RoomKey::group(group_id)), 0);
}
