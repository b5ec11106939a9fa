//! End-of-call feedback handed to the persistence layer.
//!
//! The matchmaker only assembles the record; storing it belongs to whatever
//! sits behind [`FeedbackSink`]. Delivery is fire-and-forget.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
    Report,
}

impl FeedbackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
            FeedbackKind::Report => "report",
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRecord {
    pub from_user_id: String,
    pub to_user_id: String,
    #[serde(rename = "type")]
    pub kind: FeedbackKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

pub trait FeedbackSink: Send + Sync {
    /// Must not block; failures stay inside the sink.
    fn submit(&self, record: FeedbackRecord);
}

/// Writes each record as a structured log event.
#[derive(Debug, Default, Clone)]
pub struct TracingFeedbackSink;

impl FeedbackSink for TracingFeedbackSink {
    fn submit(&self, record: FeedbackRecord) {
        tracing::info!(
            from_user_id = %record.from_user_id,
            to_user_id = %record.to_user_id,
            kind = record.kind.as_str(),
            comment = record.comment.as_deref().unwrap_or(""),
            "Feedback received"
        );
    }
}

/// Forwards records to a consumer task, e.g. a database writer.
#[derive(Debug, Clone)]
pub struct ChannelFeedbackSink {
    tx: mpsc::UnboundedSender<FeedbackRecord>,
}

impl ChannelFeedbackSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FeedbackRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FeedbackSink for ChannelFeedbackSink {
    fn submit(&self, record: FeedbackRecord) {
        if self.tx.send(record).is_err() {
            tracing::warn!("Feedback consumer is gone, record dropped");
        }
    }
}
