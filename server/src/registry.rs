//! Connection registry for the session server
//!
//! This module tracks every live TCP connection by its identity so the writer
//! task can find the socket a response is addressed to. It handles:
//! - Registration when the accept loop hands over a new socket
//! - Lookup for response delivery
//! - Removal when the connection's read loop ends
//!
//! The registry itself is plain data; the server shares it behind a
//! `tokio::sync::RwLock`, so the writer can look up connections concurrently
//! while registration and removal take the write lock briefly.

use crate::connection::{Connection, ConnectionId};
use log::info;
use std::collections::HashMap;
use std::sync::Arc;

/// Maps connection identities to their live connections.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    /// Live connections indexed by identity
    connections: HashMap<ConnectionId, Arc<Connection>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection under its own identity.
    ///
    /// Returns the connection previously registered under the same identity,
    /// if any. Identities carry an accept serial, so this only happens when a
    /// caller reuses one.
    pub fn register(&mut self, connection: Arc<Connection>) -> Option<Arc<Connection>> {
        let id = connection.id();
        info!("Client connected from {}", id);
        self.connections.insert(id, connection)
    }

    /// Looks up the connection for a response destination.
    pub fn lookup(&self, id: &ConnectionId) -> Option<Arc<Connection>> {
        self.connections.get(id).cloned()
    }

    /// Removes a connection. Returns it so the caller can close the socket.
    pub fn deregister(&mut self, id: &ConnectionId) -> Option<Arc<Connection>> {
        let removed = self.connections.remove(id);
        if removed.is_some() {
            info!("Client {} disconnected", id);
        }
        removed
    }

    /// Removes every connection, for shutdown.
    pub fn drain(&mut self) -> Vec<Arc<Connection>> {
        self.connections.drain().map(|(_, connection)| connection).collect()
    }

    /// Returns the number of currently registered connections
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Returns true if no connections are registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
