//! Test helpers for E2E tests.
//!
//! Provides TestClient, TestServer and setup helpers for driving a real
//! wicket server over TCP.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use wicket::auth::{register, register_with_role};
use wicket::config::ServerConfig;
use wicket::db::{AccountRepository, Database, Role};
use wicket::protocol::{decode_reply, encode_request, Request, Status};
use wicket::server::{ConnectionHandler, GateListener, SessionRegistry};

/// Default timeout for test operations.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Test client speaking the newline-delimited JSON protocol.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    line: String,
}

impl TestClient {
    /// Connect to the server at the given address.
    pub async fn connect(addr: SocketAddr) -> Result<Self, std::io::Error> {
        let stream = TcpStream::connect(addr).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: write_half,
            line: String::new(),
        })
    }

    /// Send one request line.
    pub async fn send_request(&mut self, request: &Request) -> Result<(), std::io::Error> {
        let encoded = encode_request(request)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        self.send_raw(&encoded).await
    }

    /// Send a raw line, newline appended. Used for malformed input tests.
    pub async fn send_raw(&mut self, line: &str) -> Result<(), std::io::Error> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    /// Receive one reply line and decode its status.
    pub async fn recv_status(&mut self) -> Result<Status, std::io::Error> {
        self.line.clear();
        let n = timeout(DEFAULT_TIMEOUT, self.reader.read_line(&mut self.line))
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "no reply within timeout")
            })??;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed",
            ));
        }
        decode_reply(&self.line)
            .map(|reply| reply.status)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Wait for the server to close the connection.
    pub async fn recv_closed(&mut self) -> Result<(), std::io::Error> {
        self.line.clear();
        let n = timeout(DEFAULT_TIMEOUT, self.reader.read_line(&mut self.line))
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "connection still open")
            })??;
        if n == 0 {
            Ok(())
        } else {
            Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unexpected data instead of close: {}", self.line.trim()),
            ))
        }
    }

    /// Send a login request and return the reply status.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Status, std::io::Error> {
        self.send_request(&Request::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;
        self.recv_status().await
    }

    /// Send a create request and return the reply status.
    pub async fn create(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<Status, std::io::Error> {
        self.send_request(&Request::Create {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;
        self.recv_status().await
    }

    /// Send a reset request and return the reply status.
    pub async fn reset(&mut self, username: &str, password: &str) -> Result<Status, std::io::Error> {
        self.send_request(&Request::Reset {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?;
        self.recv_status().await
    }

    /// Send a search request and return the reply status.
    pub async fn search(&mut self, username: &str) -> Result<Status, std::io::Error> {
        self.send_request(&Request::Search {
            username: username.to_string(),
        })
        .await?;
        self.recv_status().await
    }

    /// Send a delete request and return the reply status.
    pub async fn delete(&mut self, username: &str) -> Result<Status, std::io::Error> {
        self.send_request(&Request::Delete {
            username: username.to_string(),
        })
        .await?;
        self.recv_status().await
    }

    /// Send a logout request and wait for the server to close the connection.
    pub async fn logout(&mut self) -> Result<(), std::io::Error> {
        self.send_request(&Request::Logout).await?;
        self.recv_closed().await
    }
}

/// A wicket server running in-process on a random port.
pub struct TestServer {
    addr: SocketAddr,
    db: Arc<Database>,
    registry: SessionRegistry,
    shutdown_tx: watch::Sender<bool>,
    server_task: JoinHandle<wicket::Result<()>>,
    _tmp: TempDir,
}

impl TestServer {
    /// Start a server with a temporary file-based database.
    pub async fn start() -> Self {
        let tmp = tempfile::tempdir().expect("create temp dir");
        let db_path = tmp.path().join("wicket_test.db");
        let db = Arc::new(Database::open(&db_path).await.expect("open database"));
        let registry = SessionRegistry::new();

        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let the OS assign a port
        };
        let listener = GateListener::bind(&config).await.expect("bind listener");
        let addr = listener.local_addr().expect("local addr");

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handler_db = Arc::clone(&db);
        let handler_registry = registry.clone();
        let server_task = tokio::spawn(listener.run(
            move |stream, peer_addr| {
                let handler =
                    ConnectionHandler::new(Arc::clone(&handler_db), handler_registry.clone());
                async move {
                    let _ = handler.run(stream, peer_addr).await;
                }
            },
            shutdown_rx,
        ));

        Self {
            addr,
            db,
            registry,
            shutdown_tx,
            server_task,
            _tmp: tmp,
        }
    }

    /// Get the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Get the database handle for test setup and assertions.
    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Get the session registry for assertions.
    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Connect a fresh client to this server.
    pub async fn client(&self) -> TestClient {
        TestClient::connect(self.addr).await.expect("connect client")
    }

    /// Create a regular account directly in the store.
    pub async fn seed_account(&self, username: &str, password: &str) {
        let repo = AccountRepository::new(self.db.pool());
        register(&repo, username, password).await.expect("seed account");
    }

    /// Create an admin account directly in the store.
    pub async fn seed_admin(&self, username: &str, password: &str) {
        let repo = AccountRepository::new(self.db.pool());
        register_with_role(&repo, username, password, Role::Admin)
            .await
            .expect("seed admin");
    }

    /// Stop the server.
    ///
    /// Tests often leave clients connected at teardown, so connection tasks
    /// are aborted rather than drained.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        self.server_task.abort();
        let _ = self.server_task.await;
    }
}

/// Wait until the registry holds the expected number of sessions.
///
/// Registry cleanup after a disconnect happens asynchronously, so tests
/// poll instead of asserting immediately.
pub async fn wait_for_session_count(server: &TestServer, expected: usize) -> bool {
    let deadline = tokio::time::Instant::now() + DEFAULT_TIMEOUT;
    loop {
        if server.registry().count().await == expected {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
