//! Chat API integration tests
//!
//! Tests for the /chats endpoints: starting chats, messages and both
//! delete flavours

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::TestApp;
use crate::{assert_contains, assert_error_response};

fn ids(body: &Value, list: &str) -> Vec<i64> {
    body[list]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_i64().unwrap())
        .collect()
}

#[tokio::test]
async fn test_start_chat_requires_friendship() {
    let app = TestApp::new();

    assert_error_response!(
        app.post("/chats/start", 1, json!({ "friend_id": 2 })).await,
        StatusCode::FORBIDDEN,
        "users are not friends"
    );

    app.directory.set_failing(true);
    assert_error_response!(
        app.post("/chats/start", 1, json!({ "friend_id": 2 })).await,
        StatusCode::BAD_GATEWAY,
        "failed to validate friendship"
    );
}

#[tokio::test]
async fn test_start_chat_with_self_rejected() {
    let app = TestApp::new();
    app.directory.befriend(1, 1);

    assert_error_response!(
        app.post("/chats/start", 1, json!({ "friend_id": 1 })).await,
        StatusCode::BAD_REQUEST,
        "cannot chat with yourself"
    );
}

#[tokio::test]
async fn test_start_chat_rejects_malformed_body() {
    let app = TestApp::new();
    let (status, body) = app.post("/chats/start", 1, json!({ "friend": 2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_one_chat_per_pair() {
    let app = TestApp::new();
    let first = app.chat_between(1, 2).await;
    let again = app.chat_between(1, 2).await;
    let reversed = app.chat_between(2, 1).await;

    assert_eq!(first, again);
    assert_eq!(first, reversed);
}

#[tokio::test]
async fn test_list_chats_includes_friend_username() {
    let app = TestApp::new();
    app.directory.add_user(2, "bob");
    let chat_id = app.chat_between(1, 2).await;

    let (status, body) = app.get("/chats", 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["chats"][0]["chat_id"], chat_id);
    assert_eq!(body["chats"][0]["friend_id"], 2);
    assert_eq!(body["chats"][0]["friend_username"], "bob");

    app.directory.set_failing(true);
    assert_error_response!(
        app.get("/chats", 1).await,
        StatusCode::BAD_GATEWAY,
        "failed to load user info"
    );
}

#[tokio::test]
async fn test_send_and_list_messages() {
    let app = TestApp::new();
    app.directory.add_user(1, "alice");
    let chat_id = app.chat_between(1, 2).await;
    let uri = format!("/chats/{}/messages", chat_id);

    let (status, sent) = app.post(&uri, 1, json!({ "content": "hi bob" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["chat_id"], chat_id);
    assert_eq!(sent["sender_id"], 1);
    assert_eq!(sent["content"], "hi bob");
    assert_eq!(sent["deleted_by_sender"], false);
    assert_eq!(sent["deleted_by_receiver"], false);
    assert_eq!(sent["deleted_for_all"], false);

    app.post(&uri, 2, json!({ "content": "hey" })).await;

    let (status, listed) = app.get(&uri, 2).await;
    assert_eq!(status, StatusCode::OK);
    let messages = listed["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "hi bob");
    assert_eq!(messages[0]["sender_username"], "alice");
    assert_eq!(messages[1]["content"], "hey");
    assert!(messages[1].get("sender_username").is_none());
}

#[tokio::test]
async fn test_send_validation_and_membership() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let uri = format!("/chats/{}/messages", chat_id);

    assert_error_response!(
        app.post(&uri, 1, json!({ "content": "   " })).await,
        StatusCode::BAD_REQUEST,
        "message content cannot be empty"
    );
    assert_error_response!(
        app.post(&uri, 3, json!({ "content": "let me in" })).await,
        StatusCode::FORBIDDEN,
        "not a chat member"
    );
    assert_error_response!(
        app.get(&uri, 3).await,
        StatusCode::FORBIDDEN,
        "not a chat member"
    );
    assert_error_response!(
        app.post("/chats/404/messages", 1, json!({ "content": "anyone?" })).await,
        StatusCode::NOT_FOUND,
        "chat not found"
    );
}

#[tokio::test]
async fn test_send_checks_access_before_body() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let uri = format!("/chats/{}/messages", chat_id);

    assert_error_response!(
        app.post(&uri, 3, json!({ "text": "wrong shape" })).await,
        StatusCode::FORBIDDEN,
        "not a chat member"
    );
    assert_error_response!(
        app.post("/chats/404/messages", 1, json!({ "text": "wrong shape" })).await,
        StatusCode::NOT_FOUND,
        "chat not found"
    );

    let (status, body) = app.post(&uri, 1, json!({ "text": "wrong shape" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_malformed_ids() {
    let app = TestApp::new();

    assert_error_response!(
        app.get("/chats/abc/messages", 1).await,
        StatusCode::BAD_REQUEST,
        "invalid chat id"
    );
    assert_error_response!(
        app.delete("/chats/1/messages/xyz/me", 1).await,
        StatusCode::BAD_REQUEST,
        "invalid message id"
    );
    assert_error_response!(
        app.delete("/chats/1.5/me", 1).await,
        StatusCode::BAD_REQUEST,
        "invalid chat id"
    );
}

#[tokio::test]
async fn test_delete_for_me_only_hides_actor_side() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let uri = format!("/chats/{}/messages", chat_id);
    let (_, sent) = app.post(&uri, 1, json!({ "content": "hello" })).await;
    let message_id = sent["id"].as_i64().unwrap();

    let (status, body) = app
        .delete(&format!("{}/{}/me", uri, message_id), 2)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    assert!(ids(&app.get(&uri, 2).await.1, "messages").is_empty());
    assert_eq!(ids(&app.get(&uri, 1).await.1, "messages"), vec![message_id]);

    app.delete(&format!("{}/{}/me", uri, message_id), 1).await;
    assert!(ids(&app.get(&uri, 1).await.1, "messages").is_empty());
}

#[tokio::test]
async fn test_delete_for_all_sender_only() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;
    let uri = format!("/chats/{}/messages", chat_id);
    let (_, sent) = app.post(&uri, 1, json!({ "content": "regret" })).await;
    let delete_uri = format!("{}/{}/all", uri, sent["id"]);

    assert_error_response!(
        app.delete(&delete_uri, 2).await,
        StatusCode::FORBIDDEN,
        "only sender can delete for all"
    );
    assert_eq!(ids(&app.get(&uri, 2).await.1, "messages").len(), 1);

    let (status, _) = app.delete(&delete_uri, 1).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(ids(&app.get(&uri, 1).await.1, "messages").is_empty());
    assert!(ids(&app.get(&uri, 2).await.1, "messages").is_empty());

    let audits = app.telemetry.named("messages.delete_for_all");
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].envelope.payload["actor"]["user_id"], 1);
    assert_eq!(audits[0].envelope.payload["target"]["kind"], "chat");
}

#[tokio::test]
async fn test_delete_rejects_message_from_other_chat() {
    let app = TestApp::new();
    let first = app.chat_between(1, 2).await;
    let second = app.chat_between(1, 3).await;
    let (_, sent) = app
        .post(&format!("/chats/{}/messages", first), 1, json!({ "content": "x" }))
        .await;

    assert_error_response!(
        app.delete(&format!("/chats/{}/messages/{}/me", second, sent["id"]), 1).await,
        StatusCode::BAD_REQUEST,
        "message does not belong to chat"
    );
    assert_error_response!(
        app.delete(&format!("/chats/{}/messages/{}/all", second, sent["id"]), 1).await,
        StatusCode::BAD_REQUEST,
        "message does not belong to chat"
    );
    assert_error_response!(
        app.delete(&format!("/chats/{}/messages/999/me", first), 1).await,
        StatusCode::NOT_FOUND,
        "message not found"
    );
}

#[tokio::test]
async fn test_hidden_chat_revives_on_new_message() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;

    let (status, _) = app.delete(&format!("/chats/{}/me", chat_id), 2).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.get("/chats", 2).await.1["chats"], json!([]));
    assert_eq!(app.get("/chats", 1).await.1["chats"].as_array().unwrap().len(), 1);

    app.post(&format!("/chats/{}/messages", chat_id), 1, json!({ "content": "still there?" }))
        .await;

    let (_, body) = app.get("/chats", 2).await;
    assert_eq!(body["chats"][0]["chat_id"], chat_id);
}

#[tokio::test]
async fn test_hide_chat_requires_participant() {
    let app = TestApp::new();
    let chat_id = app.chat_between(1, 2).await;

    assert_error_response!(
        app.delete(&format!("/chats/{}/me", chat_id), 3).await,
        StatusCode::FORBIDDEN,
        "not allowed"
    );
    let (status, body) = app.request(Method::DELETE, "/chats/77/me", Some(1), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_contains!(body["error"].as_str().unwrap(), "not found");
}
