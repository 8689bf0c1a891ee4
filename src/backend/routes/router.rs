/**
 * Router Configuration
 *
 * Combines all route groups into a single Axum router.
 *
 * # Route Order
 *
 * 1. Chat and group REST routes, behind `auth_middleware`
 * 2. WebSocket routes, which authenticate during admission
 * 3. `GET /health` and `GET /metrics`, both unauthenticated
 * 4. Fallback handler (404)
 *
 * `track_http` and the `TraceLayer` wrap everything.
 */

use axum::{
    http::StatusCode,
    middleware,
    routing::get,
    Router,
};
use tower_http::trace::TraceLayer;

use crate::backend::middleware::auth::auth_middleware;
use crate::backend::middleware::http_metrics::track_http;
use crate::backend::realtime::session::{chat_socket, group_socket};
use crate::backend::routes::chat_routes::configure_chat_routes;
use crate::backend::routes::group_routes::configure_group_routes;
use crate::backend::server::state::AppState;
use crate::backend::telemetry::metrics;

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router<()> {
    let api = configure_group_routes(configure_chat_routes(Router::new())).route_layer(
        middleware::from_fn_with_state(app_state.clone(), auth_middleware),
    );

    let sockets = Router::new()
        .route("/ws/chats/{chat_id}", get(chat_socket))
        .route("/ws/groups/{group_id}", get(group_socket));

    Router::new()
        .merge(api)
        .merge(sockets)
        .route("/health", get(|| async { "ok" }))
        .route("/metrics", get(metrics::render))
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(middleware::from_fn(track_http))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
