//! State shared by every task of a running server.

use crate::accounts::UserStore;
use crate::config::ServerConfig;
use crate::connection::{Connection, ConnectionId, Incoming, Outgoing};
use crate::error::ServiceError;
use crate::lobby::RoomDirectory;
use crate::registry::ConnectionRegistry;
use crate::sessions::SessionMap;
use crate::UserId;
use log::{debug, error, info, warn};
use shared::Response;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

/// Built once per server and shared through an `Arc`.
pub struct ServerContext {
    registry: Arc<RwLock<ConnectionRegistry>>,
    sessions: SessionMap,
    rooms: RoomDirectory,
    users: UserStore,
    egress: mpsc::Sender<Outgoing>,
}

impl ServerContext {
    pub fn new(config: &ServerConfig, egress: mpsc::Sender<Outgoing>) -> Self {
        Self {
            registry: Arc::new(RwLock::new(ConnectionRegistry::new())),
            sessions: SessionMap::new(),
            rooms: RoomDirectory::new(config.mailbox_capacity()),
            users: UserStore::new(),
            egress,
        }
    }

    pub fn registry(&self) -> &Arc<RwLock<ConnectionRegistry>> {
        &self.registry
    }

    pub fn sessions(&self) -> &SessionMap {
        &self.sessions
    }

    pub fn rooms(&self) -> &RoomDirectory {
        &self.rooms
    }

    pub fn users(&self) -> &UserStore {
        &self.users
    }

    /// The user logged in on the connection a request came from.
    pub fn caller(&self, incoming: &Incoming) -> Result<UserId, ServiceError> {
        self.sessions
            .user_for(incoming.from)
            .ok_or(ServiceError::NotLoggedIn)
    }

    /// Addresses a push to whichever connection `user` is logged in on.
    /// Returns `None`, dropping the push, when the user has no session.
    pub fn push_to(&self, user: &str, response: Response) -> Option<Outgoing> {
        match self.sessions.resolve(user) {
            Some(connection) => Some(Outgoing::new(connection, response)),
            None => {
                debug!("Dropping {} push for {}: no session", response.method, user);
                None
            }
        }
    }

    /// Queues a response for the writer, waiting while the queue is full.
    pub async fn enqueue(&self, outgoing: Outgoing) {
        let to = outgoing.to;
        if let Err(e) = self.egress.send(outgoing).await {
            error!("Failed to queue response for {}: {}", to, e);
        }
    }

    /// Opens a freshly accepted connection for logins and makes it reachable
    /// by the writer.
    pub async fn connect(&self, connection: Arc<Connection>) {
        let id = connection.id();
        self.sessions.open(id);
        if let Some(stale) = self.registry.write().await.register(connection) {
            warn!("Replaced stale connection {}", stale.id());
        }
    }

    /// Forgets everything tied to a connection and shuts its socket down.
    ///
    /// The shutdown runs on its own task: it waits for the connection's write
    /// lock, which the writer may hold for as long as the peer is not reading.
    pub async fn disconnect(&self, id: ConnectionId) {
        if let Some(user) = self.sessions.close(id) {
            debug!("Session of {} ended with connection {}", user, id);
        }

        let connection = self.registry.write().await.deregister(&id);
        if let Some(connection) = connection {
            tokio::spawn(async move {
                if let Err(e) = connection.close().await {
                    warn!("Error closing connection {}: {}", connection.id(), e);
                }
            });
        }
    }

    /// Closes every registered connection.
    pub async fn close_all(&self) {
        let connections = self.registry.write().await.drain();
        info!("Closing {} connection(s)", connections.len());

        for connection in connections {
            self.sessions.close(connection.id());
            if let Err(e) = connection.close().await {
                warn!("Error closing connection {}: {}", connection.id(), e);
            }
        }
    }
}
