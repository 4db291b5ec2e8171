//! Configuration module for wicket.

use serde::Deserialize;
use std::path::Path;

use crate::{Result, WicketError};

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    2000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/wicket.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/wicket.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Bootstrap configuration for the initial administrator account.
///
/// Public registration always assigns the `user` role, so the only way to
/// obtain an `admin` account is to seed one here. When `admin_username` is
/// empty, bootstrapping is skipped.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BootstrapConfig {
    /// Username for the initial admin account (empty = disabled).
    #[serde(default)]
    pub admin_username: String,
    /// Password for the initial admin account.
    #[serde(default)]
    pub admin_password: String,
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Bootstrap configuration.
    #[serde(default)]
    pub bootstrap: BootstrapConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(WicketError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| WicketError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `WICKET_PORT`: Override the listening port
    /// - `WICKET_DB`: Override the database path
    /// - `WICKET_LOG_LEVEL`: Override the log level
    /// - `WICKET_BOOTSTRAP_PASSWORD`: Override the bootstrap admin password
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("WICKET_PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(path) = std::env::var("WICKET_DB") {
            if !path.is_empty() {
                self.database.path = path;
            }
        }
        if let Ok(level) = std::env::var("WICKET_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        // Secret material is preferably passed via environment rather than
        // checked-in config files.
        if let Ok(password) = std::env::var("WICKET_BOOTSTRAP_PASSWORD") {
            if !password.is_empty() {
                self.bootstrap.admin_password = password;
            }
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - The database path is empty
    /// - A bootstrap admin username is set without a password
    pub fn validate(&self) -> Result<()> {
        if self.database.path.is_empty() {
            return Err(WicketError::Config(
                "database.path must not be empty".to_string(),
            ));
        }
        if !self.bootstrap.admin_username.is_empty() && self.bootstrap.admin_password.is_empty() {
            return Err(WicketError::Config(
                "bootstrap.admin_username is set but admin_password is not. \
                 Set it in config.toml or via WICKET_BOOTSTRAP_PASSWORD environment variable."
                    .to_string(),
            ));
        }
        Ok(())
    }
}
