//! Session Registry: tracks connected peers and their duplex outbound
//! channels. See [`registry::SessionRegistry`] for the component itself.

pub mod error;
pub mod registry;
pub mod types;

pub use error::{SessionError, SessionResult};
pub use registry::SessionRegistry;
pub use types::{display_name, RosterEntry, Session};
