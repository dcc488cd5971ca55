//! Core domain errors (identity parsing, timestamp parsing).
//!
//! These are bounded and stable: core errors represent domain/refusal
//! states, not library implementation details.

use thiserror::Error;

/// Invalid identifier.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum InvalidId {
    #[error("project id `{raw}` is invalid: {reason}")]
    Project { raw: String, reason: String },
    #[error("user id `{raw}` is invalid: {reason}")]
    User { raw: String, reason: String },
    #[error("channel id `{raw}` is invalid: {reason}")]
    Channel { raw: String, reason: String },
    #[error("message id `{raw}` is invalid: {reason}")]
    Message { raw: String, reason: String },
    #[error("event id `{raw}` is invalid: {reason}")]
    Event { raw: String, reason: String },
}

/// Invalid RFC3339 timestamp string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("timestamp `{raw}` is invalid: {reason}")]
pub struct InvalidTimestamp {
    pub raw: String,
    pub reason: String,
}

/// Canonical error enum for the core domain layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CoreError {
    #[error(transparent)]
    InvalidId(#[from] InvalidId),
    #[error(transparent)]
    InvalidTimestamp(#[from] InvalidTimestamp),
}
