//! Audit trail
//!
//! Security-relevant actions published on the `audit_events.*` routing keys.

use std::sync::Arc;

use crate::backend::telemetry::context::RequestMeta;
use crate::backend::telemetry::sink::{build_headers, EventEnvelope, EventSink};
use crate::shared::models::{RoomKey, UserId};

pub const GROUPS_ROUTING_KEY: &str = "audit_events.groups";
pub const MESSAGES_ROUTING_KEY: &str = "audit_events.messages";

/// HTTP exchange an audited action belongs to
#[derive(Debug, Clone)]
pub struct HttpOutcome<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub status: u16,
}

#[derive(Clone)]
pub struct AuditEmitter {
    sink: Arc<dyn EventSink>,
    service: String,
    environment: String,
}

impl AuditEmitter {
    pub fn new(
        sink: Arc<dyn EventSink>,
        service: impl Into<String>,
        environment: impl Into<String>,
    ) -> Self {
        Self {
            sink,
            service: service.into(),
            environment: environment.into(),
        }
    }

    fn emit(&self, routing_key: &str, action: &str, meta: &RequestMeta, mut payload: serde_json::Value) {
        if let Some(fields) = payload.as_object_mut() {
            fields.insert("action".to_string(), action.into());
            fields.insert("service".to_string(), self.service.clone().into());
            fields.insert("environment".to_string(), self.environment.clone().into());
        }
        tracing::debug!("[Audit] {} request_id={}", action, meta.request_id);

        self.sink.publish(
            routing_key,
            EventEnvelope::new("audit_events", action, payload),
            build_headers(&meta.request_id, &meta.trace_id),
        );
    }

    /// `groups.create`, emitted for successful and failed attempts alike
    pub fn group_created(
        &self,
        actor: UserId,
        meta: &RequestMeta,
        http: HttpOutcome<'_>,
        group_id: Option<i64>,
        member_ids: &[UserId],
        error: Option<&str>,
    ) {
        let payload = serde_json::json!({
            "actor": { "user_id": actor, "device_id": meta.device_id },
            "target": { "group_id": group_id.unwrap_or(0), "member_ids": member_ids },
            "http": { "method": http.method, "path": http.path, "status": http.status },
            "result": { "ok": error.is_none(), "error": error.unwrap_or("") },
        });
        self.emit(GROUPS_ROUTING_KEY, "groups.create", meta, payload);
    }

    /// `messages.delete_for_all`
    pub fn message_deleted_for_all(
        &self,
        actor: UserId,
        meta: &RequestMeta,
        room: RoomKey,
        message_id: i64,
    ) {
        let payload = serde_json::json!({
            "actor": { "user_id": actor, "device_id": meta.device_id },
            "target": {
                "kind": room.kind.as_str(),
                "resource_id": room.resource_id,
                "message_id": message_id,
            },
            "result": { "ok": true, "error": "" },
        });
        self.emit(MESSAGES_ROUTING_KEY, "messages.delete_for_all", meta, payload);
    }
}
