//! Room directory: id allocation and per-room locking.

use crate::error::ServiceError;
use crate::room::Room;
use crate::RoomId;
use log::info;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// All rooms known to the server. Each room has its own mutex; the directory
/// lock is only held long enough to find or insert a room.
#[derive(Debug)]
pub struct RoomDirectory {
    rooms: RwLock<HashMap<RoomId, Arc<Mutex<Room>>>>,
    next_id: AtomicU64,
    mailbox_capacity: usize,
}

impl RoomDirectory {
    pub fn new(mailbox_capacity: usize) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            mailbox_capacity,
        }
    }

    /// Creates an empty room and returns its id.
    pub fn create(&self) -> RoomId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let room = Room::new(id.clone(), self.mailbox_capacity);

        self.rooms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), Arc::new(Mutex::new(room)));
        info!("Created room {}", id);
        id
    }

    pub fn get(&self, id: &str) -> Option<Arc<Mutex<Room>>> {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Runs `f` on the room while holding its lock.
    pub fn with_room<T, F>(&self, id: &str, f: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut Room) -> Result<T, ServiceError>,
    {
        let room = self.get(id).ok_or(ServiceError::RoomNotFound)?;
        let mut guard = room.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }

    pub fn len(&self) -> usize {
        self.rooms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
