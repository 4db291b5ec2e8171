//! TCP listener for the wicket server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::Result;

/// How long in-flight connections get to finish after shutdown is requested.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Gateway server that accepts TCP connections.
pub struct GateListener {
    listener: TcpListener,
}

impl GateListener {
    /// Create a new GateListener bound to the configured address.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = format!("{}:{}", config.host, config.port);
        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;

        info!("Wicket server listening on {}", local_addr);

        Ok(Self { listener })
    }

    /// Get the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept a new connection.
    ///
    /// Returns the TCP stream and the peer address.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr)> {
        let (stream, addr) = self.listener.accept().await?;
        debug!("Accepted connection from {}", addr);
        Ok((stream, addr))
    }

    /// Run the server, accepting connections and spawning handlers.
    ///
    /// The `handler` function is called for each new connection; every call
    /// runs in its own task. When the shutdown signal flips to true the
    /// listener stops accepting, gives in-flight connections a grace period
    /// to finish and then aborts whatever is still running.
    pub async fn run<F, Fut>(
        self,
        handler: F,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()>
    where
        F: Fn(TcpStream, SocketAddr) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let mut tasks: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                accepted = self.accept() => {
                    match accepted {
                        Ok((stream, addr)) => {
                            let handler = Arc::clone(&handler);
                            tasks.spawn(async move {
                                handler(stream, addr).await;
                            });
                        }
                        Err(e) => {
                            error!("Failed to accept connection: {}", e);
                        }
                    }
                }
                // Reap finished connection tasks so the set does not grow
                // without bound.
                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    if let Err(e) = result {
                        error!("Connection task failed: {}", e);
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Shutdown requested, no longer accepting connections");
                        break;
                    }
                }
            }
        }

        // Stop accepting before draining so no new task sneaks in.
        drop(self.listener);

        if !tasks.is_empty() {
            info!("Waiting for {} active connection(s)", tasks.len());
            let drain = async {
                while let Some(result) = tasks.join_next().await {
                    if let Err(e) = result {
                        error!("Connection task failed: {}", e);
                    }
                }
            };
            if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
                warn!(
                    "Aborting {} connection task(s) still running after {:?}",
                    tasks.len(),
                    SHUTDOWN_GRACE
                );
                tasks.shutdown().await;
            }
        }

        info!("Server stopped");
        Ok(())
    }
}
