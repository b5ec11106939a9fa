use serde::{Deserialize, Serialize};

use crate::feedback::FeedbackKind;
use crate::registry::ConnectionId;

/// Handshake message carried between paired peers. The relay only reads the tag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum Signal {
    Offer(serde_json::Value),
    Answer(serde_json::Value),
    IceCandidate(serde_json::Value),
}

impl Signal {
    pub fn kind(&self) -> &'static str {
        match self {
            Signal::Offer(_) => "offer",
            Signal::Answer(_) => "answer",
            Signal::IceCandidate(_) => "ice-candidate",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct OutboundSignal {
    pub to: ConnectionId,
    #[serde(flatten)]
    pub signal: Signal,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RelayedSignal {
    pub from: ConnectionId,
    #[serde(flatten)]
    pub signal: Signal,
}

/// Events a client sends to the server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientEvent {
    // Optional: binds the connection to an external user for feedback
    Identify { token: String },
    JoinQueue,
    LeaveQueue,
    Signal(OutboundSignal),
    Hangup,
    Feedback {
        #[serde(rename = "type")]
        kind: FeedbackKind,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        comment: Option<String>,
    },
}

/// Events the server pushes to a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerEvent {
    #[serde(rename_all = "camelCase")]
    Connected { connection_id: ConnectionId },
    #[serde(rename_all = "camelCase")]
    Identified { user_id: String },
    #[serde(rename_all = "camelCase")]
    MatchFound {
        partner_id: ConnectionId,
        initiator: bool,
    },
    Signal(RelayedSignal),
    PartnerDisconnected,
    Error { message: String },
}

impl ServerEvent {
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    #[test]
    fn parses_unit_events() {
        let join: ClientEvent = serde_json::from_str(r#"{"type":"join-queue"}"#).unwrap();
        assert_eq!(join, ClientEvent::JoinQueue);

        let hangup: ClientEvent = serde_json::from_str(r#"{"type":"hangup"}"#).unwrap();
        assert_eq!(hangup, ClientEvent::Hangup);
    }

    #[test]
    fn parses_signal_with_opaque_data() {
        let to = Uuid::new_v4();
        let text = json!({
            "type": "signal",
            "payload": { "to": to, "type": "ice-candidate", "data": { "candidate": "c1", "sdpMid": "0" } }
        })
        .to_string();

        let event: ClientEvent = serde_json::from_str(&text).unwrap();
        let ClientEvent::Signal(outbound) = event else {
            panic!("expected signal, got {event:?}");
        };
        assert_eq!(outbound.to, to);
        assert_eq!(
            outbound.signal,
            Signal::IceCandidate(json!({ "candidate": "c1", "sdpMid": "0" }))
        );
    }

    #[test]
    fn rejects_unknown_signal_type() {
        let text = json!({
            "type": "signal",
            "payload": { "to": Uuid::new_v4(), "type": "renegotiate", "data": "x" }
        })
        .to_string();
        assert!(serde_json::from_str::<ClientEvent>(&text).is_err());
    }

    #[test]
    fn rejects_signal_without_target() {
        let text = json!({
            "type": "signal",
            "payload": { "type": "offer", "data": "o1" }
        })
        .to_string();
        assert!(serde_json::from_str::<ClientEvent>(&text).is_err());
    }

    #[test]
    fn relayed_signal_keeps_from_type_and_data() {
        let from = Uuid::new_v4();
        let event = ServerEvent::Signal(RelayedSignal {
            from,
            signal: Signal::Offer(json!("o1")),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            value,
            json!({ "type": "signal", "payload": { "from": from, "type": "offer", "data": "o1" } })
        );
    }

    #[test]
    fn match_found_uses_camel_case_fields() {
        let partner = Uuid::new_v4();
        let value = serde_json::to_value(ServerEvent::MatchFound {
            partner_id: partner,
            initiator: true,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({ "type": "match-found", "payload": { "partnerId": partner, "initiator": true } })
        );
    }

    #[test]
    fn feedback_comment_is_optional() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"type":"feedback","payload":{"type":"like"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::Feedback {
                kind: FeedbackKind::Like,
                comment: None
            }
        );

        assert!(
            serde_json::from_str::<ClientEvent>(r#"{"type":"feedback","payload":{"type":"meh"}}"#)
                .is_err()
        );
    }
}
