//! Layer 0: Time primitives
//!
//! Every persisted and wire-visible timestamp is an RFC3339 UTC instant.
//! Ordering is plain chronological order; no logical clocks are needed
//! because the commit sequencer already serializes writes.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::error::{CoreError, InvalidTimestamp};

/// UTC instant, serialized as an RFC3339 string.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(#[serde(with = "time::serde::rfc3339")] OffsetDateTime);

impl Timestamp {
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Parse an RFC3339 string (`Z` and numeric offsets both accepted).
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        OffsetDateTime::parse(raw, &Rfc3339)
            .map(Self)
            .map_err(|err| {
                InvalidTimestamp {
                    raw: raw.to_string(),
                    reason: err.to_string(),
                }
                .into()
            })
    }

    pub fn from_odt(odt: OffsetDateTime) -> Self {
        Self(odt)
    }

    pub fn as_odt(&self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        write!(f, "{rendered}")
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({self})")
    }
}
