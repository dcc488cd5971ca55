//! Layer 5: Ledger entries
//!
//! GraphCommit is the append-only record of an accepted mutation.
//! Sequence numbers are dense and strictly increasing, assigned inside the
//! commit critical section; the highest sequence number is the ledger head.

use serde::{Deserialize, Serialize};

use super::diff::ProposedDiff;
use super::domain::CommitSource;
use super::identity::{CommitId, MessageId, ProjectId, UserId};
use super::time::Timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphCommit {
    pub commit_id: CommitId,
    /// Dense, strictly increasing from 1; never pre-allocated, never reused.
    pub sequence_number: u64,
    /// Previous head's id; `None` only for the first commit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_commit_id: Option<CommitId>,
    pub actor_user_id: UserId,
    pub timestamp: Timestamp,
    pub source: CommitSource,
    /// Snapshot of the originating diff, stored verbatim with the entry.
    pub diff: ProposedDiff,
    pub why: String,
    pub commit_message: String,
    /// Originating message record, when one matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<MessageId>,
    /// Every project this commit mutated.
    pub applies_to: Vec<ProjectId>,
}
