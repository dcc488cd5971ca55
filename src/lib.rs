#![forbid(unsafe_code)]

//! dendrite: Slack-driven knowledge-graph commit service.
//!
//! Free-text change proposals arrive from a single Slack channel, are parsed
//! into typed graph diffs (constraint upserts, dependency adds), and are
//! committed through an append-only, sequence-numbered ledger. Conflicts
//! (silent constraint overwrites, dependency cycles) are detected after the
//! commit and surfaced as notification payloads; they never block the commit.

pub mod commit;
pub mod config;
pub mod conflicts;
pub mod core;
pub mod error;
pub mod http;
pub mod ingest;
pub mod notify;
pub mod parse;
pub mod read;
pub mod service;
pub mod slack;
pub mod store;
pub mod telemetry;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use crate::core::{
    ChannelId, CommitId, CommitSource, ConflictDetail, ConflictReport, ConflictType, Constraint,
    ConstraintType, ConstraintUpsert, CoreError, Dependency, DependencyAdd, EventId, GraphCommit,
    IngestionStatus, MessageId, Project, ProjectId, ProposedDiff, ReportId, SlackMessage,
    Timestamp, UserId,
};
