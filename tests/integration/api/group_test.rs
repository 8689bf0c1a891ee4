//! Group API integration tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::assert_error_response;
use crate::common::TestApp;

#[tokio::test]
async fn test_create_group_adds_owner_and_members() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2, 3, 2]).await;

    for user in [1, 2, 3] {
        let (status, body) = app.get("/groups", user).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["groups"][0]["id"], group_id);
        assert_eq!(body["groups"][0]["owner_id"], 1);
        assert_eq!(body["groups"][0]["name"], "team");
    }
    assert_eq!(app.get("/groups", 4).await.1["groups"], json!([]));
}

#[tokio::test]
async fn test_create_group_success_is_audited() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2]).await;

    let audits = app.telemetry.named("groups.create");
    assert_eq!(audits.len(), 1);
    let event = &audits[0];
    assert_eq!(event.routing_key, "audit_events.groups");
    assert_eq!(event.envelope.event_type, "audit_events");
    assert_eq!(event.envelope.payload["target"]["group_id"], group_id);
    assert_eq!(event.envelope.payload["target"]["member_ids"], json!([2]));
    assert_eq!(event.envelope.payload["http"]["status"], 201);
    assert_eq!(event.envelope.payload["http"]["path"], "/groups");
    assert_eq!(event.envelope.payload["result"]["ok"], true);
    assert_eq!(event.envelope.payload["environment"], "test");
}

#[tokio::test]
async fn test_create_group_failures_are_audited() {
    let app = TestApp::new();

    let (status, _) = app.post("/groups", 1, json!({ "members": [2] })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_error_response!(
        app.post("/groups", 1, json!({ "name": "  ", "member_ids": [] })).await,
        StatusCode::BAD_REQUEST,
        "name is required"
    );

    app.directory.set_failing(true);
    assert_error_response!(
        app.post("/groups", 1, json!({ "name": "team", "member_ids": [2] })).await,
        StatusCode::BAD_GATEWAY,
        "failed to validate members"
    );

    let audits = app.telemetry.named("groups.create");
    let statuses: Vec<_> = audits
        .iter()
        .map(|e| e.envelope.payload["http"]["status"].as_u64().unwrap())
        .collect();
    assert_eq!(statuses, vec![400, 400, 502]);
    assert!(audits.iter().all(|e| e.envelope.payload["result"]["ok"] == false));
    assert_eq!(
        audits[2].envelope.payload["result"]["error"],
        "failed to validate members"
    );
    assert_eq!(app.get("/groups", 1).await.1["groups"], json!([]));
}

#[tokio::test]
async fn test_group_without_members_skips_directory() {
    let app = TestApp::new();
    app.directory.set_failing(true);

    let (status, body) = app.post("/groups", 1, json!({ "name": "solo" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["group_id"].is_i64());
}

#[tokio::test]
async fn test_group_messages_flow() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2]).await;
    let uri = format!("/groups/{}/messages", group_id);

    let (status, sent) = app.post(&uri, 2, json!({ "content": "hello team" })).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sent["group_id"], group_id);
    assert_eq!(sent["deleted_for_all"], false);

    let (status, listed) = app.get(&uri, 1).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["messages"][0]["content"], "hello team");
    assert_eq!(listed["messages"][0]["sender_username"], "user2");

    assert_error_response!(
        app.get(&uri, 9).await,
        StatusCode::FORBIDDEN,
        "not a member"
    );
    assert_error_response!(
        app.post(&uri, 9, json!({ "content": "hi" })).await,
        StatusCode::FORBIDDEN,
        "not a member"
    );
}

#[tokio::test]
async fn test_group_send_checks_membership_before_body() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2]).await;
    let uri = format!("/groups/{}/messages", group_id);

    assert_error_response!(
        app.post(&uri, 9, json!({ "body": 42 })).await,
        StatusCode::FORBIDDEN,
        "not a member"
    );

    let (status, _) = app.post(&uri, 2, json!({ "body": 42 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.get(&uri, 1).await.1["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_group_delete_for_all() {
    let app = TestApp::new();
    let group_id = app.group_with(1, &[2]).await;
    let uri = format!("/groups/{}/messages", group_id);
    let (_, sent) = app.post(&uri, 2, json!({ "content": "oops" })).await;
    let delete_uri = format!("{}/{}/all", uri, sent["id"]);

    assert_error_response!(
        app.delete(&delete_uri, 1).await,
        StatusCode::FORBIDDEN,
        "only sender can delete for all"
    );

    let (status, _) = app.delete(&delete_uri, 2).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(app.get(&uri, 1).await.1["messages"], json!([]));

    let audit = &app.telemetry.named("messages.delete_for_all")[0];
    assert_eq!(audit.envelope.payload["target"]["kind"], "group");
    assert_eq!(audit.envelope.payload["target"]["resource_id"], group_id);
}

#[tokio::test]
async fn test_group_malformed_ids() {
    let app = TestApp::new();
    assert_error_response!(
        app.get("/groups/x/messages", 1).await,
        StatusCode::BAD_REQUEST,
        "invalid group id"
    );
    assert_error_response!(
        app.delete("/groups/1/messages/y/all", 1).await,
        StatusCode::BAD_REQUEST,
        "invalid message id"
    );
}
