//! Wicket - Authentication and Session Gateway
//!
//! A role-gated account service accessible over TCP, implemented in Rust.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod server;

pub use auth::{
    hash_password, register, register_with_role, verify_password, PasswordError,
    RegistrationError,
};
pub use config::Config;
pub use db::{Account, AccountRepository, Database, NewAccount, Role};
pub use error::{Result, WicketError};
pub use protocol::{
    decode_reply, decode_request, encode_reply, encode_request, Reply, Request, Status,
    MAX_LINE_BYTES,
};
pub use server::{ConnectionHandler, ConnectionId, GateListener, SessionRegistry, SessionState};
