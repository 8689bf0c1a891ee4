//! Prometheus metrics
//!
//! Recorded through the `metrics` facade and rendered by
//! `metrics-exporter-prometheus` on `GET /metrics`.
//!
//! - `chat_http_requests_total{method,route,status}`
//! - `chat_http_request_duration_seconds{route}` (histogram)
//! - `chat_ws_active_connections{kind}`
//! - `chat_ws_events_total{kind,event}`

use std::time::Duration;

use axum::extract::State;
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

use crate::shared::models::RoomKind;

pub const HTTP_REQUESTS: &str = "chat_http_requests_total";
pub const HTTP_DURATION: &str = "chat_http_request_duration_seconds";
pub const WS_ACTIVE: &str = "chat_ws_active_connections";
pub const WS_EVENTS: &str = "chat_ws_events_total";

/// Prometheus client default buckets, in seconds
const HTTP_BUCKETS: [f64; 11] = [0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

/// How often histogram buckets are drained into the exporter
pub const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

fn builder() -> Result<PrometheusBuilder, BuildError> {
    PrometheusBuilder::new().set_buckets_for_metric(Matcher::Full(HTTP_DURATION.to_string()), &HTTP_BUCKETS)
}

/// Install the process-wide recorder. Fails if one is already installed.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    builder()?.install_recorder()
}

pub fn ws_connection_opened(kind: RoomKind) {
    ::metrics::gauge!(WS_ACTIVE, "kind" => kind.as_str()).increment(1.0);
}

pub fn ws_connection_closed(kind: RoomKind) {
    ::metrics::gauge!(WS_ACTIVE, "kind" => kind.as_str()).decrement(1.0);
}

pub fn ws_event(kind: RoomKind, event: &'static str) {
    ::metrics::counter!(WS_EVENTS, "kind" => kind.as_str(), "event" => event).increment(1);
}

pub fn http_request(method: &str, route: &str, status: u16, elapsed: Duration) {
    ::metrics::counter!(
        HTTP_REQUESTS,
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(HTTP_DURATION, "route" => route.to_string()).record(elapsed.as_secs_f64());
}

/// `GET /metrics`
pub async fn render(State(handle): State<PrometheusHandle>) -> String {
    handle.render()
}
