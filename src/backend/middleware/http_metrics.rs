/**
 * HTTP Metrics Middleware
 *
 * Counts every request and records its latency, labelled by the matched
 * route template. Requests no route matched fall back to the raw path.
 */

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};

use crate::backend::telemetry::metrics;

pub async fn track_http(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().clone();
    let route = match request.extensions().get::<MatchedPath>() {
        Some(path) => path.as_str().to_string(),
        None => request.uri().path().to_string(),
    };

    let response = next.run(request).await;

    metrics::http_request(method.as_str(), &route, response.status().as_u16(), started.elapsed());
    response
}
