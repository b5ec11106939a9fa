use std::collections::VecDeque;

use crate::registry::ConnectionId;

/// Connections waiting for a partner, oldest first. An id appears at most once.
#[derive(Debug, Default)]
pub struct WaitingQueue {
    entries: VecDeque<ConnectionId>,
}

impl WaitingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-joining moves the id to the back.
    pub fn enqueue(&mut self, id: ConnectionId) {
        self.remove(&id);
        self.entries.push_back(id);
    }

    /// Takes the two longest-waiting ids, or nothing if fewer than two wait.
    pub fn dequeue_pair(&mut self) -> Option<(ConnectionId, ConnectionId)> {
        if self.entries.len() < 2 {
            return None;
        }
        let first = self.entries.pop_front()?;
        let second = self.entries.pop_front()?;
        Some((first, second))
    }

    pub fn remove(&mut self, id: &ConnectionId) -> bool {
        match self.entries.iter().position(|queued| queued == id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.entries.contains(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = ConnectionId> + '_ {
        self.entries.drain(..)
    }
}
