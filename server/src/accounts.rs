//! In-memory user accounts. Passwords are stored as given.

use crate::error::ServiceError;
use crate::UserId;
use log::info;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
pub struct UserStore {
    passwords: RwLock<HashMap<String, String>>,
}

impl UserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, username: &str, password: &str) -> Result<(), ServiceError> {
        if username.trim().is_empty() {
            return Err(ServiceError::InvalidPayload(
                "username must not be empty".to_string(),
            ));
        }

        let mut passwords = self.passwords.write().unwrap_or_else(PoisonError::into_inner);
        if passwords.contains_key(username) {
            return Err(ServiceError::UserExists);
        }
        passwords.insert(username.to_string(), password.to_string());
        info!("Registered user {}", username);
        Ok(())
    }

    /// Checks credentials and returns the user's id, which is the username.
    pub fn login(&self, username: &str, password: &str) -> Result<UserId, ServiceError> {
        let passwords = self.passwords.read().unwrap_or_else(PoisonError::into_inner);
        match passwords.get(username) {
            Some(stored) if stored == password => Ok(username.to_string()),
            _ => Err(ServiceError::InvalidCredentials),
        }
    }

    pub fn len(&self) -> usize {
        self.passwords
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_register_then_login() {
        let users = UserStore::new();
        assert_ok!(users.register("alice", "secret"));
        assert_eq!(users.login("alice", "secret"), Ok("alice".to_string()));
        assert_eq!(users.len(), 1);
    }

    #[test]
    fn test_duplicate_registration() {
        let users = UserStore::new();
        users.register("alice", "secret").unwrap();
        assert_eq!(
            users.register("alice", "other"),
            Err(ServiceError::UserExists)
        );
        // The first password still works
        assert_ok!(users.login("alice", "secret"));
    }

    #[test]
    fn test_bad_credentials() {
        let users = UserStore::new();
        users.register("alice", "secret").unwrap();

        assert_eq!(
            users.login("alice", "wrong"),
            Err(ServiceError::InvalidCredentials)
        );
        assert_eq!(
            users.login("bob", "secret"),
            Err(ServiceError::InvalidCredentials)
        );
    }

    #[test]
    fn test_empty_username_rejected() {
        let users = UserStore::new();
        assert_err!(users.register("  ", "secret"));
        assert!(users.is_empty());
    }
}
