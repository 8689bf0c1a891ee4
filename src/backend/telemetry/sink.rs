//! Event sink
//!
//! Fire-and-forget publication of telemetry and audit envelopes. Publishing
//! never fails from the caller's point of view; a sink that cannot deliver
//! logs and drops.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};

/// Transport headers attached to a published envelope
pub type Headers = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub event_type: String,
    pub event_name: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    pub fn new(
        event_type: impl Into<String>,
        event_name: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            event_name: event_name.into(),
            payload,
        }
    }
}

/// `x-request-id` and `trace_id` headers, skipping empty values
pub fn build_headers(request_id: &str, trace_id: &str) -> Headers {
    let mut headers = Headers::new();
    if !request_id.is_empty() {
        headers.insert("x-request-id".to_string(), request_id.to_string());
    }
    if !trace_id.is_empty() {
        headers.insert("trace_id".to_string(), trace_id.to_string());
    }
    headers
}

pub trait EventSink: Send + Sync {
    fn publish(&self, routing_key: &str, envelope: EventEnvelope, headers: Headers);
}

/// Writes envelopes to the `telemetry` tracing target
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn publish(&self, routing_key: &str, envelope: EventEnvelope, headers: Headers) {
        let payload = serde_json::to_string(&envelope.payload).unwrap_or_default();
        tracing::info!(
            target: "telemetry",
            routing_key,
            event_type = %envelope.event_type,
            event_name = %envelope.event_name,
            request_id = headers.get("x-request-id").map(String::as_str).unwrap_or(""),
            trace_id = headers.get("trace_id").map(String::as_str).unwrap_or(""),
            %payload,
            "event published"
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub routing_key: String,
    pub envelope: EventEnvelope,
    pub headers: Headers,
}

/// Buffers everything published; for tests and local inspection
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<PublishedEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PublishedEvent> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Events whose `event_name` matches, in publication order
    pub fn named(&self, event_name: &str) -> Vec<PublishedEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.envelope.event_name == event_name)
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl EventSink for MemorySink {
    fn publish(&self, routing_key: &str, envelope: EventEnvelope, headers: Headers) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(PublishedEvent {
                routing_key: routing_key.to_string(),
                envelope,
                headers,
            });
    }
}
