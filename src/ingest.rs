//! Ingestion gate.
//!
//! Classifies every inbound event through an ordered decision list and
//! owns the `SlackMessage` lifecycle (creation and every re-stamp). The
//! rules run top-to-bottom, short-circuiting at the first match:
//!
//! 1. not a user message            -> ignored, nothing persisted
//! 2. already processed / no-op     -> re-stamp no_op_duplicate
//! 3. bot or subtype message        -> persist ignored
//! 4. unexpected channel            -> persist ignored
//! 5. invalid event payload         -> persist error
//! 6. otherwise                     -> resolve permalink, persist processed
//!
//! Rule 2 runs before 3 and 4 so a retry of an already-accepted message is
//! never reclassified as a fresh rejection.

use std::sync::Arc;

use crate::core::{ChannelId, IngestionStatus, MessageId, SlackMessage, Timestamp, UserId};
use crate::slack::events::{InboundEnvelope, MessageEvent};
use crate::slack::permalink::{fallback_permalink, PermalinkSource};
use crate::store::GraphStore;

pub const REASON_UNSUPPORTED_EVENT: &str = "unsupported_event_type";
pub const REASON_ALREADY_PROCESSED: &str = "message_already_processed";
pub const REASON_BOT_OR_SUBTYPE: &str = "bot_or_subtype_message";
pub const REASON_UNEXPECTED_CHANNEL: &str = "unexpected_channel";
pub const REASON_INVALID_PAYLOAD: &str = "invalid_event_payload";

/// Outcome of gate classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Rule 1: nothing persisted.
    NotAMessage,
    /// Rule 2: known message id in a terminal accepted state.
    Duplicate { message_id: MessageId },
    /// Rules 3-4: persisted as ignored with the given reason.
    Ignored { reason: &'static str },
    /// Rule 5: persisted as error.
    InvalidPayload { reason: String },
    /// Rule 6: persisted as processed; pipeline continues.
    Accepted {
        message_id: MessageId,
        event: MessageEvent,
        permalink: String,
    },
}

pub struct IngestionGate {
    store: Arc<GraphStore>,
    source_channel: ChannelId,
    permalinks: Arc<dyn PermalinkSource>,
}

impl IngestionGate {
    pub fn new(
        store: Arc<GraphStore>,
        source_channel: ChannelId,
        permalinks: Arc<dyn PermalinkSource>,
    ) -> Self {
        Self {
            store,
            source_channel,
            permalinks,
        }
    }

    /// Run the decision list for one inbound envelope.
    pub fn admit(&self, envelope: &InboundEnvelope) -> GateDecision {
        // Rule 1: only message events inside event callbacks are eligible.
        let event = match &envelope.event {
            Some(event) if envelope.is_event_callback() && event.is_user_message() => event,
            _ => {
                tracing::debug!(kind = %envelope.kind, "ignoring non-message event");
                return GateDecision::NotAMessage;
            }
        };

        // Rule 2: duplicate delivery of an already-accepted message.
        // Must precede bot/channel filtering.
        if let Some(message_id) = event.derive_message_id(envelope.event_id.as_ref()) {
            let prior_status = self
                .store
                .read()
                .message(&message_id)
                .map(|record| record.ingestion_status);
            if matches!(
                prior_status,
                Some(IngestionStatus::Processed | IngestionStatus::NoOpDuplicate)
            ) {
                self.store.write().stamp_message(
                    &message_id,
                    IngestionStatus::NoOpDuplicate,
                    Some(REASON_ALREADY_PROCESSED.to_string()),
                );
                tracing::info!(%message_id, "duplicate delivery absorbed");
                return GateDecision::Duplicate { message_id };
            }
        }

        // Rule 3: bot echoes and message subtypes (edits, joins, ...).
        if event.bot_id.is_some() || event.subtype.is_some() {
            self.persist_rejection(envelope, IngestionStatus::Ignored, REASON_BOT_OR_SUBTYPE);
            return GateDecision::Ignored {
                reason: REASON_BOT_OR_SUBTYPE,
            };
        }

        // Rule 4: only the configured source channel is listened to.
        if event.channel.as_deref() != Some(self.source_channel.as_str()) {
            self.persist_rejection(envelope, IngestionStatus::Ignored, REASON_UNEXPECTED_CHANNEL);
            return GateDecision::Ignored {
                reason: REASON_UNEXPECTED_CHANNEL,
            };
        }

        // Rule 5: event-shape validation.
        let validated = match event.validate() {
            Ok(validated) => validated,
            Err(field) => {
                let reason = format!("{REASON_INVALID_PAYLOAD}: missing or blank `{field}`");
                self.persist_rejection(envelope, IngestionStatus::Error, &reason);
                return GateDecision::InvalidPayload { reason };
            }
        };

        // Rule 6: accept. Permalink lookup degrades to the deterministic
        // fallback and never blocks ingestion.
        let message_id = validated.message_id(envelope.event_id.as_ref());
        let permalink = match self.permalinks.permalink(&validated.channel, &validated.ts) {
            Ok(permalink) => permalink,
            Err(err) => {
                tracing::warn!(error = %err, "permalink lookup failed, using fallback");
                fallback_permalink(&validated.channel, &validated.ts)
            }
        };

        let record = SlackMessage {
            message_id: message_id.clone(),
            event_id: envelope.event_id.clone(),
            ts: validated.ts.clone(),
            channel: validated.channel.clone(),
            user: validated.user.clone(),
            text: validated.text.clone(),
            permalink: Some(permalink.clone()),
            ingestion_status: IngestionStatus::Processed,
            error_reason: None,
            received_at: Timestamp::now(),
        };
        // First sight creates the record; a known id (an earlier rejection
        // being retried, or a concurrent insert) is only re-stamped.
        {
            let mut state = self.store.write();
            if state.message(&message_id).is_some() {
                state.stamp_message(&message_id, IngestionStatus::Processed, None);
            } else if let Err(err) = state.insert_message(record) {
                tracing::debug!(error = %err, "message record insert raced");
            }
        }

        tracing::debug!(%message_id, "message accepted for parsing");
        GateDecision::Accepted {
            message_id,
            event: validated,
            permalink,
        }
    }

    /// Downstream transition: re-stamp a message the gate accepted earlier
    /// (parse failure, unknown project, no-op, commit error).
    pub fn stamp(&self, message_id: &MessageId, status: IngestionStatus, reason: Option<String>) {
        if !self.store.write().stamp_message(message_id, status, reason) {
            tracing::warn!(%message_id, "stamp for unknown message record");
        }
    }

    /// Persist a rejected event when enough payload exists to anchor a
    /// record; rejections without a derivable id are classification-only.
    fn persist_rejection(
        &self,
        envelope: &InboundEnvelope,
        status: IngestionStatus,
        reason: &str,
    ) {
        let Some(event) = &envelope.event else {
            return;
        };
        let Some(message_id) = event.derive_message_id(envelope.event_id.as_ref()) else {
            tracing::debug!(reason, "rejected event has no derivable message id");
            return;
        };

        // Rejected payloads may be missing fields; record placeholders so
        // the idempotency anchor still exists.
        let channel = event
            .channel
            .as_deref()
            .and_then(|raw| ChannelId::new(raw).ok())
            .unwrap_or_else(placeholder_channel);
        let user = event
            .user
            .as_deref()
            .and_then(|raw| UserId::new(raw).ok())
            .unwrap_or_else(placeholder_user);

        let record = SlackMessage {
            message_id: message_id.clone(),
            event_id: envelope.event_id.clone(),
            ts: event.ts.clone().unwrap_or_default(),
            channel,
            user,
            text: event.text.clone().unwrap_or_default(),
            permalink: None,
            ingestion_status: status,
            error_reason: Some(reason.to_string()),
            received_at: Timestamp::now(),
        };

        let mut state = self.store.write();
        if state.message(&message_id).is_some() {
            state.stamp_message(&message_id, status, Some(reason.to_string()));
        } else if let Err(err) = state.insert_message(record) {
            tracing::debug!(error = %err, "rejection record insert raced");
        }
        tracing::info!(%message_id, status = status.as_str(), reason, "message rejected");
    }
}

fn placeholder_channel() -> ChannelId {
    ChannelId::new("-").expect("non-blank literal")
}

fn placeholder_user() -> UserId {
    UserId::new("-").expect("non-blank literal")
}
