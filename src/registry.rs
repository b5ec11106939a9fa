use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::protocol::ServerEvent;

/// Server-assigned id of one live socket.
pub type ConnectionId = Uuid;

pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Server-side view of the per-connection state machine. Whether the peers'
/// media path is up is only known to the clients, so an established call
/// stays `Connecting` here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Searching,
    Connecting,
}

#[derive(Debug)]
pub struct Connection {
    tx: EventSender,
    pub phase: Phase,
    pub user_id: Option<String>,
    /// External id of the most recent partner, kept after the call ends.
    pub last_partner_user: Option<String>,
}

/// Owns every live connection. The queue and call table refer to entries by id only.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: ConnectionId, tx: EventSender) {
        self.connections.insert(
            id,
            Connection {
                tx,
                phase: Phase::Idle,
                user_id: None,
                last_partner_user: None,
            },
        );
    }

    pub fn unregister(&self, id: &ConnectionId) -> Option<Connection> {
        self.connections.remove(id).map(|(_, conn)| conn)
    }

    /// Best-effort push. Returns false if the connection is gone or its writer closed.
    pub fn send(&self, id: &ConnectionId, event: ServerEvent) -> bool {
        match self.connections.get(id) {
            Some(conn) => conn.tx.send(event).is_ok(),
            None => false,
        }
    }

    pub fn set_phase(&self, id: &ConnectionId, phase: Phase) {
        if let Some(mut conn) = self.connections.get_mut(id) {
            conn.phase = phase;
        }
    }

    pub fn phase(&self, id: &ConnectionId) -> Option<Phase> {
        self.connections.get(id).map(|conn| conn.phase)
    }

    pub fn set_user(&self, id: &ConnectionId, user_id: String) {
        if let Some(mut conn) = self.connections.get_mut(id) {
            conn.user_id = Some(user_id);
        }
    }

    pub fn user_of(&self, id: &ConnectionId) -> Option<String> {
        self.connections.get(id).and_then(|conn| conn.user_id.clone())
    }

    pub fn remember_partner(&self, id: &ConnectionId, partner_user: Option<String>) {
        if let Some(mut conn) = self.connections.get_mut(id) {
            conn.last_partner_user = partner_user;
        }
    }

    pub fn last_partner_user(&self, id: &ConnectionId) -> Option<String> {
        self.connections
            .get(id)
            .and_then(|conn| conn.last_partner_user.clone())
    }

    pub fn take_last_partner_user(&self, id: &ConnectionId) -> Option<String> {
        self.connections
            .get_mut(id)
            .and_then(|mut conn| conn.last_partner_user.take())
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
