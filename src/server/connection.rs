//! Per-connection request handling.
//!
//! Provides the connection loop and the state machine that gates which
//! request kinds a client may issue.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::TcpStream;
use tracing::{debug, error, info, warn};

use crate::auth::{hash_password, register, verify_password, RegistrationError};
use crate::db::{AccountRepository, Database, Role};
use crate::error::Result;
use crate::protocol::{decode_request, encode_reply, Reply, Request, Status, MAX_LINE_BYTES};
use crate::server::registry::{ConnectionId, SessionRegistry};

/// Lifecycle state of a single client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected but not logged in. Accepts login, create and reset.
    Unauthenticated,
    /// Logged in with the given role. Accepts search, delete and logout.
    Authenticated(Role),
    /// Closed. No further requests are processed.
    Terminated,
}

/// Handler for a single client connection.
pub struct ConnectionHandler {
    /// Identifier for this connection.
    id: ConnectionId,
    /// Current lifecycle state.
    state: SessionState,
    /// Database connection.
    db: Arc<Database>,
    /// Shared registry of authenticated connections.
    registry: SessionRegistry,
}

impl ConnectionHandler {
    /// Create a handler for a freshly accepted connection.
    pub fn new(db: Arc<Database>, registry: SessionRegistry) -> Self {
        Self {
            id: ConnectionId::new(),
            state: SessionState::Unauthenticated,
            db,
            registry,
        }
    }

    /// Get the connection id.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Get the current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Run the connection loop until the client disconnects or logs out.
    ///
    /// Reads one request per line, dispatches it according to the current
    /// state and writes back one reply line for each handled request.
    /// Transport and decode errors end the loop; the registry entry is
    /// always removed before the connection is torn down.
    pub async fn run(mut self, stream: TcpStream, peer_addr: SocketAddr) -> Result<()> {
        info!(connection = %self.id, ip = %peer_addr, "Client connected");

        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half).take(MAX_LINE_BYTES as u64);
        let mut line = String::new();

        while self.state != SessionState::Terminated {
            line.clear();
            // Re-arm the cap for each line so one request cannot shrink the
            // budget of the next.
            reader.set_limit(MAX_LINE_BYTES as u64);

            match reader.read_line(&mut line).await {
                Ok(0) => {
                    debug!(connection = %self.id, "Client disconnected");
                    break;
                }
                Ok(_) => {
                    if !line.ends_with('\n') && line.len() >= MAX_LINE_BYTES {
                        warn!(
                            connection = %self.id,
                            "Request line exceeds {} bytes, closing connection",
                            MAX_LINE_BYTES
                        );
                        break;
                    }
                }
                Err(e) => {
                    warn!(connection = %self.id, "Read error: {}", e);
                    break;
                }
            }

            let request = match decode_request(&line) {
                Ok(request) => request,
                Err(e) => {
                    warn!(connection = %self.id, "Malformed request: {}", e);
                    break;
                }
            };

            if let Some(status) = self.dispatch(request, peer_addr).await {
                if let Err(e) = send_reply(&mut write_half, Reply::new(status)).await {
                    warn!(connection = %self.id, "Write error: {}", e);
                    break;
                }
            }
        }

        self.terminate().await;
        debug!(connection = %self.id, "Connection closed");
        Ok(())
    }

    /// Dispatch a request according to the current state.
    ///
    /// Returns the status to report, or None when the request kind is not
    /// valid in the current state and is silently dropped.
    async fn dispatch(&mut self, request: Request, peer_addr: SocketAddr) -> Option<Status> {
        match self.state {
            SessionState::Unauthenticated => match request {
                Request::Login { username, password } => {
                    Some(self.handle_login(&username, &password, peer_addr).await)
                }
                Request::Create { username, password } => {
                    Some(self.handle_create(&username, &password).await)
                }
                Request::Reset { username, password } => {
                    Some(self.handle_reset(&username, &password).await)
                }
                other => {
                    debug!(
                        connection = %self.id,
                        kind = other.kind(),
                        "Dropped request not accepted before login"
                    );
                    None
                }
            },
            SessionState::Authenticated(role) => match request {
                Request::Search { username } => Some(self.handle_search(&username).await),
                Request::Delete { username } => Some(self.handle_delete(&username, role).await),
                Request::Logout => {
                    self.handle_logout().await;
                    None
                }
                other => {
                    debug!(
                        connection = %self.id,
                        kind = other.kind(),
                        "Dropped request not accepted after login"
                    );
                    None
                }
            },
            SessionState::Terminated => None,
        }
    }

    /// Handle a login request.
    async fn handle_login(
        &mut self,
        username: &str,
        password: &str,
        peer_addr: SocketAddr,
    ) -> Status {
        let repo = AccountRepository::new(self.db.pool());

        let account = match repo.get_by_username(username).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!(
                    username = %username,
                    ip = %peer_addr,
                    "Login failed: user not found"
                );
                return Status::UserNotFound;
            }
            Err(e) => {
                error!("Database error during login: {}", e);
                return Status::RequestFailed;
            }
        };

        if verify_password(password, &account.password).is_err() {
            warn!(
                username = %username,
                ip = %peer_addr,
                "Login failed: invalid password"
            );
            return Status::LogInFailed;
        }

        // Registry entry and state switch happen back to back; no other
        // request on this connection can observe one without the other.
        self.registry.add(self.id, account.role).await;
        self.state = SessionState::Authenticated(account.role);

        if let Err(e) = repo.update_last_login(account.id).await {
            warn!("Failed to update last login: {}", e);
        }

        info!(
            username = %username,
            role = %account.role,
            ip = %peer_addr,
            "Login successful"
        );
        Status::LoggedIn
    }

    /// Handle an account creation request.
    ///
    /// The created account always gets the `user` role; clients cannot
    /// request anything else.
    async fn handle_create(&mut self, username: &str, password: &str) -> Status {
        let repo = AccountRepository::new(self.db.pool());

        match register(&repo, username, password).await {
            Ok(account) => {
                info!(
                    username = %account.username,
                    account_id = account.id,
                    "Account created"
                );
                Status::UserAdded
            }
            Err(RegistrationError::UsernameExists) => {
                debug!(username = %username, "Create rejected: username taken");
                Status::UserNameNotAvailable
            }
            Err(e) => {
                error!("Registration error: {}", e);
                Status::RequestFailed
            }
        }
    }

    /// Handle a password reset request.
    async fn handle_reset(&mut self, username: &str, password: &str) -> Status {
        let repo = AccountRepository::new(self.db.pool());

        match repo.username_exists(username).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(username = %username, "Reset rejected: user not found");
                return Status::UserNotFound;
            }
            Err(e) => {
                error!("Database error during password reset: {}", e);
                return Status::RequestFailed;
            }
        }

        let hash = match hash_password(password) {
            Ok(hash) => hash,
            Err(e) => {
                error!("Password hashing failed during reset: {}", e);
                return Status::RequestFailed;
            }
        };

        match repo.update_password(username, &hash).await {
            Ok(true) => {
                info!(username = %username, "Password reset");
                Status::PasswordReset
            }
            Ok(false) => {
                // The account vanished between the existence check and the
                // update.
                Status::UserNotFound
            }
            Err(e) => {
                error!("Database error during password reset: {}", e);
                Status::RequestFailed
            }
        }
    }

    /// Handle a search request.
    async fn handle_search(&self, username: &str) -> Status {
        let repo = AccountRepository::new(self.db.pool());

        match repo.username_exists(username).await {
            Ok(true) => Status::UserFound,
            Ok(false) => Status::UserNotFound,
            Err(e) => {
                error!("Database error during search: {}", e);
                Status::RequestFailed
            }
        }
    }

    /// Handle a delete request.
    ///
    /// Requires the admin role and an existing target account. Both failure
    /// modes report the same generic status so a client cannot tell which
    /// condition was not met.
    async fn handle_delete(&mut self, username: &str, role: Role) -> Status {
        if !role.is_admin() {
            warn!(
                connection = %self.id,
                username = %username,
                "Delete rejected: admin role required"
            );
            return Status::RequestFailed;
        }

        let repo = AccountRepository::new(self.db.pool());

        match repo.delete_by_username(username).await {
            Ok(true) => {
                info!(username = %username, "Account removed");
                Status::UserRemoved
            }
            Ok(false) => {
                debug!(username = %username, "Delete rejected: user not found");
                Status::RequestFailed
            }
            Err(e) => {
                error!("Database error during delete: {}", e);
                Status::RequestFailed
            }
        }
    }

    /// Handle a logout request.
    ///
    /// Removes the registry entry and terminates the connection. No reply
    /// is sent; the client observes the connection closing.
    async fn handle_logout(&mut self) {
        self.registry.remove(self.id).await;
        self.state = SessionState::Terminated;
        info!(connection = %self.id, "Logged out");
    }

    /// Tear down the connection state.
    ///
    /// Removes the registry entry if the connection was authenticated, so a
    /// dropped connection can never linger as logged in.
    async fn terminate(&mut self) {
        if matches!(self.state, SessionState::Authenticated(_)) {
            self.registry.remove(self.id).await;
        }
        self.state = SessionState::Terminated;
    }
}

/// Write one reply line to the client.
async fn send_reply(writer: &mut OwnedWriteHalf, reply: Reply) -> Result<()> {
    let encoded = encode_reply(&reply)?;
    writer.write_all(encoded.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}
