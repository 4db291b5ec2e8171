//! Reply messages and the status vocabulary for the wicket wire protocol.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of a handled request.
///
/// This vocabulary is stable: clients match on these exact strings.
/// `REQUEST_FAILED` is the deliberately uninformative outcome used for
/// refused deletes and internal store failures, so a caller cannot tell
/// which condition was not met.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    LoggedIn,
    LogInFailed,
    UserAdded,
    UserFound,
    UserNotFound,
    UserRemoved,
    UserNameNotAvailable,
    PasswordReset,
    RequestFailed,
}

impl Status {
    /// The status as it appears on the wire, for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::LoggedIn => "LOGGED_IN",
            Status::LogInFailed => "LOG_IN_FAILED",
            Status::UserAdded => "USER_ADDED",
            Status::UserFound => "USER_FOUND",
            Status::UserNotFound => "USER_NOT_FOUND",
            Status::UserRemoved => "USER_REMOVED",
            Status::UserNameNotAvailable => "USER_NAME_NOT_AVAILABLE",
            Status::PasswordReset => "PASSWORD_RESET",
            Status::RequestFailed => "REQUEST_FAILED",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A reply line sent to the client: one status per handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reply {
    /// The outcome being reported.
    pub status: Status,
}

impl Reply {
    /// Create a reply carrying the given status.
    pub fn new(status: Status) -> Self {
        Self { status }
    }
}

impl From<Status> for Reply {
    fn from(status: Status) -> Self {
        Self::new(status)
    }
}
