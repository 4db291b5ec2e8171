//! Account registration for wicket.
//!
//! This module provides account creation on top of the credential store.
//! Uniqueness is left to the store's constraint: there is no exists-check
//! before the insert, so concurrent registrations of the same username
//! resolve to exactly one winner.

use thiserror::Error;
use tracing::info;

use crate::auth::{hash_password, PasswordError};
use crate::db::{Account, AccountRepository, NewAccount, Role};
use crate::WicketError;

/// Registration-specific errors.
#[derive(Error, Debug)]
pub enum RegistrationError {
    /// Username already exists.
    #[error("username already exists")]
    UsernameExists,

    /// Password hashing failed.
    #[error("password error: {0}")]
    Password(#[from] PasswordError),

    /// Database error.
    #[error("database error: {0}")]
    Database(String),
}

/// Register a new account with the default `user` role.
///
/// This is the public registration path: the role cannot be chosen by the
/// caller.
///
/// # Arguments
///
/// * `repo` - The account repository
/// * `username` - Desired username
/// * `password` - Plaintext password, hashed before storage
///
/// # Returns
///
/// The newly created account on success, or a `RegistrationError` on failure.
pub async fn register(
    repo: &AccountRepository<'_>,
    username: &str,
    password: &str,
) -> std::result::Result<Account, RegistrationError> {
    let password_hash = hash_password(password)?;

    let account = repo
        .create(&NewAccount::new(username, password_hash))
        .await
        .map_err(map_create_error)?;

    info!(
        username = %account.username,
        account_id = account.id,
        "New account registered"
    );

    Ok(account)
}

/// Register a new account with a specific role.
///
/// This is typically used for creating the initial admin account at startup;
/// it never runs on behalf of a connected client.
///
/// # Arguments
///
/// * `repo` - The account repository
/// * `username` - Desired username
/// * `password` - Plaintext password, hashed before storage
/// * `role` - The role to assign to the new account
pub async fn register_with_role(
    repo: &AccountRepository<'_>,
    username: &str,
    password: &str,
    role: Role,
) -> std::result::Result<Account, RegistrationError> {
    let password_hash = hash_password(password)?;

    let account = repo
        .create(&NewAccount::new(username, password_hash).with_role(role))
        .await
        .map_err(map_create_error)?;

    info!(
        username = %account.username,
        account_id = account.id,
        role = %role,
        "New account registered with role"
    );

    Ok(account)
}

fn map_create_error(e: WicketError) -> RegistrationError {
    match e {
        WicketError::UsernameTaken(_) => RegistrationError::UsernameExists,
        other => RegistrationError::Database(other.to_string()),
    }
}
