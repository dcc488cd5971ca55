//! Inbound event envelope.
//!
//! Every field of the embedded event is optional at the wire layer so the
//! ingestion gate can classify malformed payloads explicitly instead of
//! failing the decode; `MessageEvent` is the validated shape.

use serde::Deserialize;

use crate::core::{ChannelId, EventId, MessageId, UserId};

pub const ENVELOPE_URL_VERIFICATION: &str = "url_verification";
pub const ENVELOPE_EVENT_CALLBACK: &str = "event_callback";
pub const EVENT_MESSAGE: &str = "message";

/// The webhook JSON envelope as Slack sends it.
#[derive(Debug, Clone, Deserialize)]
pub struct InboundEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub challenge: Option<String>,
    #[serde(default)]
    pub event_id: Option<EventId>,
    #[serde(default)]
    pub event: Option<RawEvent>,
}

impl InboundEnvelope {
    pub fn is_url_verification(&self) -> bool {
        self.kind == ENVELOPE_URL_VERIFICATION
    }

    pub fn is_event_callback(&self) -> bool {
        self.kind == ENVELOPE_EVENT_CALLBACK
    }
}

/// The embedded event object, shape-unchecked.
#[derive(Debug, Clone, Deserialize)]
pub struct RawEvent {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
}

impl RawEvent {
    pub fn is_user_message(&self) -> bool {
        self.kind == EVENT_MESSAGE
    }

    /// Validate the event shape into a usable message event.
    ///
    /// Returns the first missing/blank field name on failure; the gate
    /// persists it as `invalid_event_payload: <field>`.
    pub fn validate(&self) -> Result<MessageEvent, &'static str> {
        let channel = match self.channel.as_deref() {
            Some(raw) => ChannelId::new(raw).map_err(|_| "channel")?,
            None => return Err("channel"),
        };
        let user = match self.user.as_deref() {
            Some(raw) => UserId::new(raw).map_err(|_| "user")?,
            None => return Err("user"),
        };
        let ts = match self.ts.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.to_string(),
            _ => return Err("ts"),
        };
        let text = match self.text.as_deref() {
            Some(raw) => raw.to_string(),
            None => return Err("text"),
        };
        Ok(MessageEvent {
            channel,
            user,
            ts,
            text,
        })
    }

    /// Derive the idempotency key, when enough of the payload is present.
    pub fn derive_message_id(&self, event_id: Option<&EventId>) -> Option<MessageId> {
        if let Some(event_id) = event_id {
            return Some(MessageId::from_event_id(event_id));
        }
        let channel = ChannelId::new(self.channel.as_deref()?).ok()?;
        let ts = self.ts.as_deref()?;
        if ts.trim().is_empty() {
            return None;
        }
        Some(MessageId::from_channel_ts(&channel, ts))
    }
}

/// A shape-validated user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel: ChannelId,
    pub user: UserId,
    pub ts: String,
    pub text: String,
}

impl MessageEvent {
    pub fn message_id(&self, event_id: Option<&EventId>) -> MessageId {
        match event_id {
            Some(event_id) => MessageId::from_event_id(event_id),
            None => MessageId::from_channel_ts(&self.channel, &self.ts),
        }
    }
}

/// Decode the raw webhook body.
pub fn decode_envelope(body: &[u8]) -> Result<InboundEnvelope, serde_json::Error> {
    serde_json::from_slice(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn envelope(value: serde_json::Value) -> InboundEnvelope {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn url_verification_decodes() {
        let env = envelope(serde_json::json!({
            "type": "url_verification",
            "challenge": "abc123",
        }));
        assert!(env.is_url_verification());
        assert_eq!(env.challenge.as_deref(), Some("abc123"));
    }

    #[test]
    fn event_callback_decodes_with_partial_event() {
        let env = envelope(serde_json::json!({
            "type": "event_callback",
            "event_id": "Ev001",
            "event": { "type": "message", "channel": "C042", "user": "U1", "ts": "1.2", "text": "hi" },
        }));
        let event = env.event.unwrap();
        assert!(event.is_user_message());
        let validated = event.validate().unwrap();
        assert_eq!(validated.channel.as_str(), "C042");
        assert_eq!(validated.text, "hi");
    }

    #[test]
    fn missing_field_names_the_field() {
        let event = RawEvent {
            kind: EVENT_MESSAGE.into(),
            subtype: None,
            bot_id: None,
            channel: Some("C042".into()),
            user: Some("U1".into()),
            ts: None,
            text: Some("hi".into()),
        };
        assert_eq!(event.validate().unwrap_err(), "ts");
    }

    #[test]
    fn message_id_prefers_event_id() {
        let event = RawEvent {
            kind: EVENT_MESSAGE.into(),
            subtype: None,
            bot_id: None,
            channel: Some("C042".into()),
            user: Some("U1".into()),
            ts: Some("1.2".into()),
            text: Some("hi".into()),
        };
        let event_id = EventId::new("Ev001").unwrap();
        assert_eq!(
            event.derive_message_id(Some(&event_id)).unwrap().as_str(),
            "Ev001"
        );
        assert_eq!(event.derive_message_id(None).unwrap().as_str(), "C042:1.2");
    }
}
