//! Session registry for the wicket server.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::db::Role;

/// Process-unique identifier for one client connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Table of authenticated connections and their roles.
///
/// This is the sole authority for "is this connection logged in": an entry
/// is added only on successful login and removed on logout or disconnect.
/// The registry is created once at startup and cloned into each connection
/// task; clones share the same underlying table.
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<ConnectionId, Role>>>,
}

impl SessionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Insert or overwrite the entry for a connection.
    pub async fn add(&self, id: ConnectionId, role: Role) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(id, role);
        debug!(
            "Registered session {} as {} (total: {})",
            id,
            role,
            sessions.len()
        );
    }

    /// Remove the entry for a connection. No-op if absent.
    pub async fn remove(&self, id: ConnectionId) {
        let mut sessions = self.sessions.write().await;
        if sessions.remove(&id).is_some() {
            debug!("Unregistered session {} (total: {})", id, sessions.len());
        }
    }

    /// Get the role for a connection, or None if it is not logged in.
    pub async fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.sessions.read().await.get(&id).copied()
    }

    /// Check whether a connection is logged in.
    pub async fn contains(&self, id: ConnectionId) -> bool {
        self.sessions.read().await.contains_key(&id)
    }

    /// Get the number of authenticated connections.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Get the ids of all authenticated connections.
    pub async fn connections(&self) -> Vec<ConnectionId> {
        self.sessions.read().await.keys().copied().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for SessionRegistry {
    fn clone(&self) -> Self {
        Self {
            sessions: Arc::clone(&self.sessions),
        }
    }
}
