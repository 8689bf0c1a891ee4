//! Request correlation metadata
//!
//! Device id, client IP, request id and trace id pulled from incoming
//! request headers. Carried into connection metadata and audit envelopes.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, HeaderMap};
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub device_id: String,
    pub ip: String,
    pub request_id: String,
    pub trace_id: String,
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

impl RequestMeta {
    /// Build from headers. Missing request and trace ids are generated.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = header(headers, "x-forwarded-for")
            .and_then(|forwarded| forwarded.split(',').next())
            .map(str::trim)
            .or_else(|| header(headers, "x-real-ip"))
            .unwrap_or_default()
            .to_string();

        Self {
            device_id: header(headers, "x-device-id").unwrap_or_default().to_string(),
            ip,
            request_id: header(headers, "x-request-id")
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            trace_id: header(headers, "x-trace-id")
                .map(str::to_string)
                .unwrap_or_else(|| Uuid::new_v4().simple().to_string()),
        }
    }
}

impl<S> FromRequestParts<S> for RequestMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}
