use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info};

use wicket::auth::{register_with_role, RegistrationError};
use wicket::db::{AccountRepository, Database, Role};
use wicket::server::{ConnectionHandler, GateListener, SessionRegistry};
use wicket::{Config, WicketError};

#[tokio::main]
async fn main() {
    // Load configuration
    let config = match Config::load_with_env("config.toml") {
        Ok(config) => config,
        Err(WicketError::Io(_)) => {
            eprintln!("config.toml not found, using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
        Err(e) => {
            eprintln!("Failed to load config.toml: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = wicket::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        // Fall back to console-only logging
        wicket::logging::init_console_only(&config.logging.level);
    }

    info!("Wicket - authentication and session gateway");

    // Open the credential store
    let db = match Database::open(&config.database.path).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to open database {}: {}", config.database.path, e);
            std::process::exit(1);
        }
    };

    // Seed the initial admin account if configured
    if let Err(e) = bootstrap_admin(&db, &config).await {
        error!("Failed to bootstrap admin account: {}", e);
        std::process::exit(1);
    }

    // Bind the listener
    let listener = match GateListener::bind(&config.server).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(
                "Failed to bind {}:{}: {}",
                config.server.host, config.server.port, e
            );
            std::process::exit(1);
        }
    };

    let registry = SessionRegistry::new();

    // Broadcast shutdown on ctrl-c
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received ctrl-c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    let handler_db = Arc::clone(&db);
    let handler_registry = registry.clone();
    let result = listener
        .run(
            move |stream, peer_addr| {
                let handler =
                    ConnectionHandler::new(Arc::clone(&handler_db), handler_registry.clone());
                async move {
                    if let Err(e) = handler.run(stream, peer_addr).await {
                        error!("Connection error: {}", e);
                    }
                }
            },
            shutdown_rx,
        )
        .await;

    if let Err(e) = result {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    let remaining = registry.count().await;
    if remaining > 0 {
        info!("{} session(s) still registered at shutdown", remaining);
        for id in registry.connections().await {
            debug!("Session {} was still registered", id);
        }
    }
}

/// Create the initial admin account if the bootstrap section is configured.
///
/// Public registration always assigns the `user` role, so this is the only
/// path to an `admin` account. An already existing account with the
/// configured username is left untouched.
async fn bootstrap_admin(db: &Database, config: &Config) -> wicket::Result<()> {
    if config.bootstrap.admin_username.is_empty() {
        return Ok(());
    }

    let repo = AccountRepository::new(db.pool());
    match register_with_role(
        &repo,
        &config.bootstrap.admin_username,
        &config.bootstrap.admin_password,
        Role::Admin,
    )
    .await
    {
        Ok(account) => {
            info!(username = %account.username, "Bootstrap admin account created");
            Ok(())
        }
        Err(RegistrationError::UsernameExists) => {
            info!(
                username = %config.bootstrap.admin_username,
                "Bootstrap admin account already exists"
            );
            Ok(())
        }
        Err(e) => Err(WicketError::Auth(e.to_string())),
    }
}
