//! Layer 6: Ingested-message records
//!
//! SlackMessage is the idempotency ledger for inbound events: created on
//! first sight of a message id, afterwards only re-stamped with a new
//! status. Records are never duplicated or deleted.

use serde::{Deserialize, Serialize};

use super::domain::IngestionStatus;
use super::identity::{ChannelId, EventId, MessageId, UserId};
use super::time::Timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlackMessage {
    pub message_id: MessageId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    /// Slack's own message timestamp string (`"1700000000.000100"`).
    pub ts: String,
    pub channel: ChannelId,
    pub user: UserId,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permalink: Option<String>,
    pub ingestion_status: IngestionStatus,
    /// Reason code for any non-`processed` terminal status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
    pub received_at: Timestamp,
}

impl SlackMessage {
    /// Re-stamp the record with a new terminal status.
    pub fn stamp(&mut self, status: IngestionStatus, reason: Option<String>) {
        self.ingestion_status = status;
        self.error_reason = reason;
    }
}
