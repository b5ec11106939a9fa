use std::collections::HashMap;

use crate::error::CallError;
use crate::registry::ConnectionId;

/// Symmetric partner mapping for every connection currently in a call.
#[derive(Debug, Default)]
pub struct CallTable {
    partners: HashMap<ConnectionId, ConnectionId>,
}

impl CallTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects the pair without touching existing state if either side is busy.
    pub fn begin(&mut self, a: ConnectionId, b: ConnectionId) -> Result<(), CallError> {
        if a == b {
            return Err(CallError::SelfPairing(a));
        }
        for id in [a, b] {
            if self.partners.contains_key(&id) {
                return Err(CallError::AlreadyInCall(id));
            }
        }
        self.partners.insert(a, b);
        self.partners.insert(b, a);
        Ok(())
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<ConnectionId> {
        self.partners.get(id).copied()
    }

    /// Removes both directions and returns the partner, if `id` was in a call.
    pub fn end(&mut self, id: &ConnectionId) -> Option<ConnectionId> {
        let partner = self.partners.remove(id)?;
        self.partners.remove(&partner);
        Some(partner)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.partners.contains_key(id)
    }

    /// Number of connections in a call, i.e. twice the number of calls.
    pub fn participants(&self) -> usize {
        self.partners.len()
    }

    /// Empties the table, yielding each call once.
    pub fn drain_calls(&mut self) -> Vec<(ConnectionId, ConnectionId)> {
        let mut calls = Vec::with_capacity(self.partners.len() / 2);
        let ids: Vec<ConnectionId> = self.partners.keys().copied().collect();
        for id in ids {
            if let Some(partner) = self.end(&id) {
                calls.push((id, partner));
            }
        }
        calls
    }
}
