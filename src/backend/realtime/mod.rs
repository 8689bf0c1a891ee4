//! Real-time Delivery Module
//!
//! WebSocket fan-out for chat and group rooms.
//!
//! # Architecture
//!
//! - **`connection`** - One attached socket with serialized, time-bounded writes
//! - **`registry`** - Room to connection map
//! - **`broadcast`** - Fan-out of wire events to a room
//! - **`session`** - Admission and lifecycle of a socket
//!
//! # Module Structure
//!
//! ```text
//! realtime/
//! ├── mod.rs          - Module exports and documentation
//! ├── connection.rs   - Connection, ConnInfo, TransportError
//! ├── registry.rs     - ConnectionRegistry
//! ├── broadcast.rs    - Broadcaster, DeliveryReport
//! └── session.rs      - SessionManager and the /ws handlers
//! ```
//!
//! Clients only listen. Messages and deletions arrive over HTTP and reach
//! sockets through `Broadcaster::publish`.

pub mod connection;

pub mod registry;

pub mod broadcast;

pub mod session;

pub use broadcast::{Broadcaster, DeliveryReport};
pub use connection::{ConnInfo, Connection, TransportError};
pub use registry::ConnectionRegistry;
pub use session::{chat_socket, group_socket, Closure, SessionManager};
