//! Bounded per-member chat queue.

use std::collections::VecDeque;

/// Upper bound accepted for a configured mailbox capacity.
pub const MAX_MAILBOX_CAPACITY: usize = 100;

/// FIFO of chat messages waiting for one room member. When full, pushing a
/// new message evicts the oldest one, so senders never block.
#[derive(Debug, Clone)]
pub struct Mailbox {
    messages: VecDeque<String>,
    capacity: usize,
}

impl Mailbox {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, MAX_MAILBOX_CAPACITY);
        Self {
            messages: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Enqueues a message, returning the evicted one on overflow.
    pub fn push(&mut self, message: String) -> Option<String> {
        let evicted = if self.messages.len() >= self.capacity {
            self.messages.pop_front()
        } else {
            None
        };
        self.messages.push_back(message);
        evicted
    }

    pub fn pop(&mut self) -> Option<String> {
        self.messages.pop_front()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    #[cfg(test)]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
