//! Request messages for the wicket wire protocol.

use serde::{Deserialize, Serialize};

/// A client request.
///
/// On the wire this is a JSON object tagged by `kind`, e.g.
/// `{"kind":"login","username":"alice","password":"pw"}`. The password field
/// is only present for the account-lifecycle kinds; unknown extra fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Request {
    /// Authenticate with an existing account.
    Login { username: String, password: String },
    /// Create a new account (role is always `user`).
    Create { username: String, password: String },
    /// Overwrite an existing account's password.
    Reset { username: String, password: String },
    /// Look up whether an account exists.
    Search { username: String },
    /// Remove an account (admin only).
    Delete { username: String },
    /// End the authenticated session.
    Logout,
}

impl Request {
    /// The request kind as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Login { .. } => "login",
            Request::Create { .. } => "create",
            Request::Reset { .. } => "reset",
            Request::Search { .. } => "search",
            Request::Delete { .. } => "delete",
            Request::Logout => "logout",
        }
    }
}
