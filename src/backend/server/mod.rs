//! Server Module
//!
//! Configuration, application state and startup wiring.
//!
//! - **`config`** - `ServerConfig` from the environment, database loading
//! - **`state`** - `AppState` and its `FromRef` implementations
//! - **`init`** - `build_state` and `create_app`
//!
//! ```text
//! server/
//! ├── mod.rs    - Module exports and documentation
//! ├── config.rs - Configuration loading
//! ├── state.rs  - AppState and FromRef implementations
//! └── init.rs   - Server initialization and app creation
//! ```

/// Application state management
pub mod state;

/// Server configuration loading
pub mod config;

/// Server initialization
pub mod init;

pub use config::{ConfigError, ServerConfig};
pub use init::{build_state, create_app, StartupError};
pub use state::AppState;
