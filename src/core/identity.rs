//! Layer 1: Identity atoms
//!
//! ProjectId / UserId / ChannelId: externally assigned string ids.
//! MessageId / EventId: idempotency anchors for inbound Slack events.
//! CommitId / ConstraintId / ReportId: UUIDs minted by this service.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::{CoreError, InvalidId};

macro_rules! string_id {
    ($name:ident, $variant:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Construct from a non-blank string.
            pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
                let s = s.into();
                if s.trim().is_empty() {
                    Err(InvalidId::$variant {
                        raw: s,
                        reason: "blank".into(),
                    }
                    .into())
                } else {
                    Ok(Self(s))
                }
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

string_id!(ProjectId, Project, "Project identifier from the static registry.");
string_id!(UserId, User, "Slack user identifier.");
string_id!(ChannelId, Channel, "Slack channel identifier.");
string_id!(EventId, Event, "Slack event identifier (`Ev...`).");

/// Idempotency key for an ingested message.
///
/// Derived from the external event id when present, otherwise from
/// `<channel>:<ts>` which Slack guarantees unique within a channel.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    pub fn new(s: impl Into<String>) -> Result<Self, CoreError> {
        let s = s.into();
        if s.trim().is_empty() {
            Err(InvalidId::Message {
                raw: s,
                reason: "blank".into(),
            }
            .into())
        } else {
            Ok(Self(s))
        }
    }

    pub fn from_event_id(event_id: &EventId) -> Self {
        Self(event_id.as_str().to_string())
    }

    pub fn from_channel_ts(channel: &ChannelId, ts: &str) -> Self {
        Self(format!("{}:{}", channel.as_str(), ts))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MessageId({:?})", self.0)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

macro_rules! uuid_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh random id.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

uuid_id!(CommitId, "Ledger commit identifier.");
uuid_id!(ConstraintId, "Constraint version identifier.");
uuid_id!(ReportId, "Conflict report identifier.");
