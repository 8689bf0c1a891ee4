//! Health and routing tests

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_needs_no_auth() {
    let app = TestApp::new();
    let (status, body) = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!("ok"));
}

#[tokio::test]
async fn test_metrics_exposed_without_auth() {
    let app = TestApp::new();
    app.request(Method::GET, "/health", None, None).await;
    app.get("/chats/abc/messages", 1).await;

    let (status, body) = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().expect("metrics are plain text");
    assert!(text
        .lines()
        .any(|line| line.starts_with("chat_http_requests_total{")
            && line.contains("route=\"/health\"")
            && line.contains("status=\"200\"")));
    assert!(text
        .lines()
        .any(|line| line.starts_with("chat_http_requests_total{")
            && line.contains("route=\"/chats/{chat_id}/messages\"")
            && line.contains("status=\"400\"")));
    assert!(text.contains("chat_http_request_duration_seconds_bucket"));
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = TestApp::new();
    let (status, _) = app.request(Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_rest_routes_require_token() {
    let app = TestApp::new();
    for (method, uri) in [
        (Method::GET, "/chats"),
        (Method::POST, "/chats/start"),
        (Method::GET, "/groups"),
        (Method::GET, "/chats/1/messages"),
        (Method::DELETE, "/groups/1/messages/1/all"),
    ] {
        let (status, body) = app.request(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{}: {}", uri, body);
    }
}
