//! Route Configuration Module
//!
//! HTTP and WebSocket routes of the service.
//!
//! - **`router`** - Main router creation and route assembly
//! - **`chat_routes`** - Private chat REST routes
//! - **`group_routes`** - Group REST routes
//!
//! ```text
//! routes/
//! ├── mod.rs          - Module exports and documentation
//! ├── router.rs       - Main router creation
//! ├── chat_routes.rs  - /chats routes
//! └── group_routes.rs - /groups routes
//! ```

pub mod router;

pub mod chat_routes;

pub mod group_routes;

pub use router::create_router;
