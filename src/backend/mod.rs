//! Backend Module
//!
//! Server-side code of the chat service: an Axum HTTP server for private
//! chats and groups, plus WebSocket rooms that push new messages and
//! deletions to connected clients.
//!
//! # Architecture
//!
//! - **`server`** - Configuration, application state, startup
//! - **`routes`** - Route configuration and router assembly
//! - **`chat`** - Private chat REST handlers
//! - **`groups`** - Group REST handlers
//! - **`messaging`** - Event coordinator (persist then broadcast)
//! - **`realtime`** - Connection registry, broadcaster, socket sessions
//! - **`store`** - Persistence traits with PostgreSQL and in-memory backends
//! - **`auth`** - Token authority and user directory client
//! - **`telemetry`** - Lifecycle and audit events, Prometheus metrics
//! - **`middleware`** - Request authentication and HTTP metrics
//! - **`error`** - Backend error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs       - Module exports and documentation
//! ├── server/      - Config, state, init
//! ├── routes/      - Route configuration
//! ├── chat/        - /chats handlers
//! ├── groups/      - /groups handlers
//! ├── messaging/   - EventCoordinator
//! ├── realtime/    - WebSocket fan-out
//! ├── store/       - Store traits, PgStore, MemoryStore
//! ├── auth/        - AuthAuthority, UserDirectory
//! ├── telemetry/   - EventSink, lifecycle and audit events, metrics
//! ├── middleware/  - auth_middleware, track_http
//! └── error/       - BackendError
//! ```
//!
//! # Thread Safety
//!
//! Collaborators are shared through `Arc`. The connection registry's lock
//! is the only shared mutable state in the process and is never held
//! across I/O.

/// Server setup and configuration
pub mod server;

/// Route configuration
pub mod routes;

/// Private chat handlers
pub mod chat;

/// Group handlers
pub mod groups;

/// Persist-then-broadcast coordination
pub mod messaging;

/// WebSocket rooms
pub mod realtime;

/// Persistence
pub mod store;

/// Backend error types
pub mod error;

/// Token validation and user directory
pub mod auth;

/// Lifecycle and audit events
pub mod telemetry;

/// Middleware for request processing
pub mod middleware;

pub use error::BackendError;
pub use messaging::EventCoordinator;
pub use realtime::{Broadcaster, ConnectionRegistry, SessionManager};
pub use server::{build_state, create_app, AppState};
pub use store::Store;
