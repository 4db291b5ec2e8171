//! Account repository for wicket.
//!
//! This module provides CRUD operations for accounts in the credential store.

use sqlx::error::ErrorKind;
use sqlx::SqlitePool;

use super::account::{Account, NewAccount};
use crate::{Result, WicketError};

/// Repository for account CRUD operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    /// Create a new AccountRepository with the given database pool reference.
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account in the store.
    ///
    /// Uniqueness is enforced by the store's constraint, not a prior
    /// exists-check, so two concurrent creates of the same username cannot
    /// both succeed. A duplicate surfaces as [`WicketError::UsernameTaken`].
    pub async fn create(&self, new_account: &NewAccount) -> Result<Account> {
        let result = sqlx::query("INSERT INTO accounts (username, password, role) VALUES (?, ?, ?)")
            .bind(&new_account.username)
            .bind(&new_account.password)
            .bind(new_account.role.as_str())
            .execute(self.pool)
            .await
            .map_err(|e| match &e {
                sqlx::Error::Database(db_err) if db_err.kind() == ErrorKind::UniqueViolation => {
                    WicketError::UsernameTaken(new_account.username.clone())
                }
                _ => WicketError::Database(e.to_string()),
            })?;

        let id = result.last_insert_rowid();
        self.get_by_id(id)
            .await?
            .ok_or_else(|| WicketError::NotFound("account".to_string()))
    }

    /// Get an account by ID.
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Account>> {
        let result = sqlx::query_as::<_, Account>(
            "SELECT id, username, password, role, created_at, last_login
             FROM accounts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| WicketError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Get an account by username (case-sensitive).
    pub async fn get_by_username(&self, username: &str) -> Result<Option<Account>> {
        let result = sqlx::query_as::<_, Account>(
            "SELECT id, username, password, role, created_at, last_login
             FROM accounts WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| WicketError::Database(e.to_string()))?;

        Ok(result)
    }

    /// Overwrite the stored password hash for a username.
    ///
    /// Returns true if a row was updated, false if the username is absent.
    pub async fn update_password(&self, username: &str, new_hash: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE accounts SET password = ? WHERE username = ?")
            .bind(new_hash)
            .bind(username)
            .execute(self.pool)
            .await
            .map_err(|e| WicketError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Update the last login timestamp for an account.
    pub async fn update_last_login(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE accounts SET last_login = datetime('now') WHERE id = ?")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| WicketError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete an account by username.
    ///
    /// Returns true if an account was deleted, false if not found.
    pub async fn delete_by_username(&self, username: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE username = ?")
            .bind(username)
            .execute(self.pool)
            .await
            .map_err(|e| WicketError::Database(e.to_string()))?;
        Ok(result.rows_affected() > 0)
    }

    /// Check if a username is already taken (case-sensitive).
    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM accounts WHERE username = ?)")
                .bind(username)
                .fetch_one(self.pool)
                .await
                .map_err(|e| WicketError::Database(e.to_string()))?;
        Ok(exists.0)
    }

    /// Count all accounts.
    pub async fn count(&self) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM accounts")
            .fetch_one(self.pool)
            .await
            .map_err(|e| WicketError::Database(e.to_string()))?;
        Ok(count.0)
    }
}
