//! Matchmaking queue and signaling relay.
//!
//! The waiting queue and call table share one mutex so that pairing
//! (dequeue two, begin a call) is a single atomic step with respect to every
//! join, leave, hangup and disconnect. Lock order is always this mutex first,
//! then a registry shard.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::auth::IdentityVerifier;
use crate::calls::CallTable;
use crate::error::ClientError;
use crate::feedback::{FeedbackKind, FeedbackRecord, FeedbackSink};
use crate::protocol::{ClientEvent, OutboundSignal, RelayedSignal, ServerEvent};
use crate::queue::WaitingQueue;
use crate::registry::{ConnectionId, ConnectionRegistry, EventSender, Phase};

#[derive(Debug, Default)]
struct MatchState {
    queue: WaitingQueue,
    calls: CallTable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub connections: usize,
    pub waiting: usize,
    pub in_call: usize,
}

pub struct Matchmaker {
    state: Mutex<MatchState>,
    registry: ConnectionRegistry,
    identity: Option<IdentityVerifier>,
    feedback: Arc<dyn FeedbackSink>,
}

impl Matchmaker {
    pub fn new(identity: Option<IdentityVerifier>, feedback: Arc<dyn FeedbackSink>) -> Self {
        Self {
            state: Mutex::new(MatchState::default()),
            registry: ConnectionRegistry::new(),
            identity,
            feedback,
        }
    }

    pub fn connect(&self, id: ConnectionId, tx: EventSender) {
        self.registry.register(id, tx);
        self.registry
            .send(&id, ServerEvent::Connected { connection_id: id });
        tracing::info!(connection_id = %id, "Connection registered");
    }

    /// Routes one inbound event. Boundary errors go back to the sender only.
    pub fn handle(&self, id: ConnectionId, event: ClientEvent) {
        let result = match event {
            ClientEvent::Identify { token } => self.identify(&id, &token).map(|user_id| {
                self.registry.send(&id, ServerEvent::Identified { user_id });
            }),
            ClientEvent::JoinQueue => self.join(id),
            ClientEvent::LeaveQueue => {
                self.leave(&id);
                Ok(())
            }
            ClientEvent::Signal(signal) => {
                self.relay(id, signal);
                Ok(())
            }
            ClientEvent::Hangup => {
                self.hangup(&id);
                Ok(())
            }
            ClientEvent::Feedback { kind, comment } => self.submit_feedback(&id, kind, comment),
        };

        if let Err(err) = result {
            self.reject(&id, err);
        }
    }

    pub fn reject(&self, id: &ConnectionId, err: ClientError) {
        tracing::debug!(connection_id = %id, error = %err, "Request rejected");
        self.registry.send(id, ServerEvent::error(err.code()));
    }

    pub fn join(&self, id: ConnectionId) -> Result<(), ClientError> {
        let mut state = self.state.lock();
        if state.calls.contains(&id) {
            return Err(ClientError::AlreadyInCall);
        }

        state.queue.enqueue(id);
        self.registry.set_phase(&id, Phase::Searching);
        tracing::debug!(connection_id = %id, waiting = state.queue.len(), "Joined queue");

        self.pair_waiting(&mut state);
        Ok(())
    }

    pub fn leave(&self, id: &ConnectionId) {
        let mut state = self.state.lock();
        if state.queue.remove(id) {
            self.registry.set_phase(id, Phase::Idle);
            tracing::debug!(connection_id = %id, "Left queue");
        }
    }

    fn pair_waiting(&self, state: &mut MatchState) {
        let Some((initiator, receiver)) = state.queue.dequeue_pair() else {
            return;
        };

        if let Err(err) = state.calls.begin(initiator, receiver) {
            tracing::error!(
                initiator = %initiator,
                receiver = %receiver,
                error = %err,
                "Refusing to pair"
            );
            self.registry.set_phase(&initiator, Phase::Idle);
            self.registry.set_phase(&receiver, Phase::Idle);
            return;
        }

        for (id, partner) in [(initiator, receiver), (receiver, initiator)] {
            self.registry.set_phase(&id, Phase::Connecting);
            self.registry
                .remember_partner(&id, self.registry.user_of(&partner));
        }

        self.registry.send(
            &initiator,
            ServerEvent::MatchFound {
                partner_id: receiver,
                initiator: true,
            },
        );
        self.registry.send(
            &receiver,
            ServerEvent::MatchFound {
                partner_id: initiator,
                initiator: false,
            },
        );
        tracing::info!(initiator = %initiator, receiver = %receiver, "Call started");
    }

    /// Forwards to the sender's current partner. Anything else is a stale
    /// reference and is dropped without telling anyone.
    pub fn relay(&self, from: ConnectionId, outbound: OutboundSignal) {
        let partner = self.state.lock().calls.partner_of(&from);

        match partner {
            Some(partner) if partner == outbound.to => {
                let kind = outbound.signal.kind();
                let delivered = self.registry.send(
                    &partner,
                    ServerEvent::Signal(RelayedSignal {
                        from,
                        signal: outbound.signal,
                    }),
                );
                tracing::trace!(from = %from, to = %partner, kind, delivered, "Signal relayed");
            }
            _ => {
                tracing::debug!(from = %from, to = %outbound.to, "Signal dropped, no matching partner");
            }
        }
    }

    /// Ends the caller's call, if any. Returns whether a partner was notified.
    pub fn hangup(&self, id: &ConnectionId) -> bool {
        let mut state = self.state.lock();
        self.end_call(&mut state, id)
    }

    fn end_call(&self, state: &mut MatchState, id: &ConnectionId) -> bool {
        let Some(partner) = state.calls.end(id) else {
            return false;
        };

        self.registry.set_phase(id, Phase::Idle);
        self.registry.set_phase(&partner, Phase::Idle);
        self.registry.send(&partner, ServerEvent::PartnerDisconnected);
        tracing::info!(connection_id = %id, partner = %partner, "Call ended");
        true
    }

    /// Full teardown for a closed socket. Safe to call more than once.
    pub fn disconnect(&self, id: &ConnectionId) {
        let mut state = self.state.lock();
        state.queue.remove(id);
        self.end_call(&mut state, id);
        if self.registry.unregister(id).is_some() {
            tracing::info!(connection_id = %id, "Connection closed");
        }
    }

    pub fn identify(&self, id: &ConnectionId, token: &str) -> Result<String, ClientError> {
        let verifier = self
            .identity
            .as_ref()
            .ok_or(ClientError::IdentityUnavailable)?;

        let user_id = verifier.verify(token).map_err(|err| {
            tracing::warn!(connection_id = %id, error = %err, "Identify failed");
            ClientError::InvalidToken
        })?;

        self.registry.set_user(id, user_id.clone());
        tracing::info!(connection_id = %id, user_id = %user_id, "Connection identified");
        Ok(user_id)
    }

    pub fn submit_feedback(
        &self,
        id: &ConnectionId,
        kind: FeedbackKind,
        comment: Option<String>,
    ) -> Result<(), ClientError> {
        // Only once per finished call
        let state = self.state.lock();
        if state.calls.contains(id) {
            return Err(ClientError::FeedbackUnavailable);
        }
        let from_user_id = self
            .registry
            .user_of(id)
            .ok_or(ClientError::FeedbackUnavailable)?;
        let to_user_id = self
            .registry
            .take_last_partner_user(id)
            .ok_or(ClientError::FeedbackUnavailable)?;
        drop(state);

        self.feedback.submit(FeedbackRecord {
            from_user_id,
            to_user_id,
            kind,
            comment,
        });
        Ok(())
    }

    /// Drops every waiting entry and tells both sides of every call that it is over.
    pub fn shutdown(&self) {
        let mut state = self.state.lock();

        let waiting: Vec<_> = state.queue.drain().collect();
        for id in &waiting {
            self.registry.set_phase(id, Phase::Idle);
        }

        let calls = state.calls.drain_calls();
        for (a, b) in &calls {
            for id in [a, b] {
                self.registry.set_phase(id, Phase::Idle);
                self.registry.send(id, ServerEvent::PartnerDisconnected);
            }
        }

        tracing::info!(
            waiting = waiting.len(),
            calls = calls.len(),
            "Matchmaker shut down"
        );
    }

    pub fn snapshot(&self) -> Snapshot {
        let state = self.state.lock();
        Snapshot {
            connections: self.registry.len(),
            waiting: state.queue.len(),
            in_call: state.calls.participants(),
        }
    }

    pub fn phase(&self, id: &ConnectionId) -> Option<Phase> {
        self.registry.phase(id)
    }

    pub fn partner_of(&self, id: &ConnectionId) -> Option<ConnectionId> {
        self.state.lock().calls.partner_of(id)
    }
}
