//! Error types for wicket.

use thiserror::Error;

/// Common error type for wicket.
#[derive(Error, Debug)]
pub enum WicketError {
    /// Database error.
    ///
    /// Generic database error wrapping anything the sqlx backend reports.
    /// Database errors from sqlx are automatically converted.
    #[error("database error: {0}")]
    Database(String),

    /// Database connection error.
    #[error("database connection error: {0}")]
    DatabaseConnection(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Username already taken at account creation.
    ///
    /// Raised from the store's unique constraint, so concurrent creates of
    /// the same username cannot both succeed.
    #[error("username not available: {0}")]
    UsernameTaken(String),

    /// Wire protocol error (malformed or oversized request line).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

// Conversion from sqlx errors
impl From<sqlx::Error> for WicketError {
    fn from(e: sqlx::Error) -> Self {
        WicketError::Database(e.to_string())
    }
}

/// Result type alias for wicket operations.
pub type Result<T> = std::result::Result<T, WicketError>;
