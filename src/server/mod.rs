//! Wicket server module.
//!
//! This module provides the TCP listener, the per-connection state machine
//! and the registry of authenticated connections.

mod connection;
mod listener;
mod registry;

pub use connection::{ConnectionHandler, SessionState};
pub use listener::GateListener;
pub use registry::{ConnectionId, SessionRegistry};
