//! Chatline - Realtime Chat Backend
//!
//! A chat service for private one-to-one chats and groups. Messages are
//! stored in PostgreSQL and pushed to every WebSocket attached to the
//! chat or group room.
//!
//! # Module Structure
//!
//! - **`shared`** - Domain types and wire formats
//!   - Rooms, chats, groups, messages and their visibility state machine
//!   - Realtime wire events
//!   - REST request and response bodies
//!
//! - **`backend`** - The Axum server
//!   - REST handlers for chats and groups
//!   - Connection registry, broadcaster and socket sessions
//!   - Persistence, token validation, user directory client
//!   - Lifecycle and audit telemetry
//!
//! # Usage
//!
//! ```rust,no_run
//! use chatline::backend::server::{create_app, ServerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::from_env()?;
//! let app = create_app(&config).await?;
//! let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port)).await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Realtime Delivery
//!
//! Clients open `GET /ws/chats/{id}` or `GET /ws/groups/{id}` and only
//! listen. Every stored message is pushed as
//! `{"type":"message","message":{...}}` and every delete-for-all as
//! `{"type":"delete_for_all","message_id":N}`.

/// Shared types and data structures
pub mod shared;

/// Backend server-side code
pub mod backend;
