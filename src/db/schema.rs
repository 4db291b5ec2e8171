//! Database schema and migrations for wicket.
//!
//! This module contains all database migrations that will be applied
//! sequentially when the database is first opened or upgraded.

/// Database migrations.
///
/// Each migration is a SQL script that will be executed in order.
/// The schema_version table tracks which migrations have been applied.
pub const MIGRATIONS: &[&str] = &[
    // v1: Initial schema - accounts table
    r#"
-- Accounts table for the credential store.
-- Usernames are unique and case-sensitive (default BINARY collation).
CREATE TABLE accounts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE,
    password    TEXT NOT NULL,           -- Argon2 hash
    role        TEXT NOT NULL DEFAULT 'user',  -- 'user', 'admin'
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_accounts_role ON accounts(role);
"#,
    // v2: Track the most recent successful login per account
    r#"
ALTER TABLE accounts ADD COLUMN last_login TEXT;
"#,
];
