//! External identity collaborators
//!
//! - **`sessions`** - bearer token validation (`AuthAuthority`, `JwtAuthority`)
//! - **`directory`** - friendship and profile lookups (`UserDirectory`, `HttpUserDirectory`)

pub mod sessions;

pub mod directory;

pub use directory::{DirectoryError, HttpUserDirectory, UserDirectory};
pub use sessions::{AuthAuthority, AuthError, JwtAuthority};
