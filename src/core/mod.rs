//! Core domain types (Layers 0-6)
//!
//! Module hierarchy follows type dependency order:
//! - time: Timestamp (Layer 0)
//! - identity: ProjectId, UserId, MessageId, CommitId, ... (Layer 1)
//! - domain: ConstraintType, CommitSource, IngestionStatus (Layer 2)
//! - project / constraint / dependency: graph nodes and edges (Layer 3)
//! - diff: ProposedDiff and its origin (Layer 4)
//! - commit: GraphCommit ledger entry (Layer 5)
//! - conflict / message: post-commit reports, ingested-message records (Layer 6)

pub mod commit;
pub mod conflict;
pub mod constraint;
pub mod dependency;
pub mod diff;
pub mod domain;
pub mod error;
pub mod identity;
pub mod message;
pub mod project;
pub mod time;

pub use commit::GraphCommit;
pub use conflict::{ConflictDetail, ConflictReport, ConflictType};
pub use constraint::{Constraint, ConstraintKey};
pub use dependency::{Dependency, DependencyKey};
pub use diff::{ChangeOrigin, ConstraintUpsert, DependencyAdd, ProposedDiff};
pub use domain::{CommitSource, ConstraintType, IngestionStatus};
pub use error::{CoreError, InvalidId, InvalidTimestamp};
pub use identity::{ChannelId, CommitId, ConstraintId, EventId, MessageId, ProjectId, ReportId, UserId};
pub use message::SlackMessage;
pub use project::Project;
pub use time::Timestamp;
