//! Telemetry Module
//!
//! Structured events about connections and audited actions, published
//! through an `EventSink`.
//!
//! - **`sink`** - `EventSink` trait, `TracingSink`, `MemorySink`
//! - **`context`** - `RequestMeta` correlation headers
//! - **`events`** - WebSocket lifecycle events
//! - **`audit`** - `AuditEmitter`
//! - **`metrics`** - Prometheus counters, gauges and the `/metrics` handler

pub mod sink;

pub mod context;

pub mod events;

pub mod audit;

pub mod metrics;

pub use audit::AuditEmitter;
pub use context::RequestMeta;
pub use events::{publish_lifecycle, LifecycleEvent};
pub use sink::{EventEnvelope, EventSink, MemorySink, TracingSink};
