//! Signaling and relay coordinator for ad-hoc peer-to-peer file transfer.
//!
//! Five components, each owning its own storage:
//! [`codec`] marshals the wire envelope, [`session`] owns live peer
//! sessions and the device roster, [`liveness`] evicts half-open sessions,
//! [`transfer`] owns per-transfer state, and [`router`] ties the two
//! stores together into the chunk-relay state machine. [`transport`] hosts
//! all of it behind a WebSocket endpoint.

pub mod codec;
pub mod config;
pub mod liveness;
pub mod metrics;
pub mod router;
pub mod session;
pub mod transfer;
pub mod transport;
