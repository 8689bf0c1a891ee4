//! Messaging Module
//!
//! Sending messages and deleting them for everyone, with the resulting
//! events pushed to the room's sockets.

pub mod coordinator;

pub use coordinator::EventCoordinator;
