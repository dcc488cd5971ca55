//! Slack boundary: inbound event envelopes, request signature
//! verification, and permalink resolution.
//!
//! Everything here is wire plumbing; the ingestion state machine itself
//! lives in `crate::ingest`.

pub mod events;
pub mod permalink;
pub mod signature;

pub use events::{InboundEnvelope, MessageEvent, RawEvent};
pub use permalink::{fallback_permalink, NoPermalinks, PermalinkError, PermalinkSource, SlackApiPermalinks};
pub use signature::{SignatureError, SIGNATURE_HEADER, TIMESTAMP_HEADER};
