//! User ⇄ connection bindings.
//!
//! A binding is created on login and removed on logout or when the bound
//! connection goes away. Pushes are addressed through it, so a user without a
//! binding simply receives nothing.
//!
//! The map also tracks which connections are open. Handlers run on their own
//! tasks and may finish after their connection was torn down, so `bind` and
//! `close` take the same lock and a closed connection can never be bound.

use crate::connection::ConnectionId;
use crate::error::ServiceError;
use crate::UserId;
use log::debug;
use std::collections::{HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
struct Bindings {
    open: HashSet<ConnectionId>,
    by_user: HashMap<UserId, ConnectionId>,
    by_connection: HashMap<ConnectionId, UserId>,
}

impl Bindings {
    fn unbind_connection(&mut self, connection: ConnectionId) -> Option<UserId> {
        let user = self.by_connection.remove(&connection)?;
        self.by_user.remove(&user);
        Some(user)
    }
}

/// At most one connection per user and one user per connection.
#[derive(Debug, Default)]
pub struct SessionMap {
    bindings: RwLock<Bindings>,
}

impl SessionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a freshly accepted connection as open for logins.
    pub fn open(&self, connection: ConnectionId) {
        self.write().open.insert(connection);
    }

    /// Marks a connection closed and drops whatever user was bound to it.
    pub fn close(&self, connection: ConnectionId) -> Option<UserId> {
        let mut bindings = self.write();
        bindings.open.remove(&connection);
        bindings.unbind_connection(connection)
    }

    pub fn is_open(&self, connection: ConnectionId) -> bool {
        self.read().open.contains(&connection)
    }

    /// Binds `user` to `connection`, replacing any older binding of either.
    /// Fails without touching anything when the connection is not open.
    pub fn bind(&self, user: &str, connection: ConnectionId) -> Result<(), ServiceError> {
        let mut bindings = self.write();
        if !bindings.open.contains(&connection) {
            return Err(ServiceError::ConnectionClosed);
        }

        if let Some(previous) = bindings.by_user.remove(user) {
            bindings.by_connection.remove(&previous);
        }
        if let Some(previous) = bindings.by_connection.remove(&connection) {
            bindings.by_user.remove(&previous);
        }

        bindings.by_user.insert(user.to_string(), connection);
        bindings.by_connection.insert(connection, user.to_string());
        debug!("Bound user {} to {}", user, connection);
        Ok(())
    }

    pub fn unbind(&self, user: &str) -> Option<ConnectionId> {
        let mut bindings = self.write();
        let connection = bindings.by_user.remove(user)?;
        bindings.by_connection.remove(&connection);
        Some(connection)
    }

    pub fn resolve(&self, user: &str) -> Option<ConnectionId> {
        self.read().by_user.get(user).copied()
    }

    pub fn user_for(&self, connection: ConnectionId) -> Option<UserId> {
        self.read().by_connection.get(&connection).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> RwLockReadGuard<'_, Bindings> {
        self.bindings.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Bindings> {
        self.bindings.write().unwrap_or_else(PoisonError::into_inner)
    }
}
