//! Layer 4: Proposed diffs
//!
//! The two typed mutations the parser can produce, plus the origin
//! attribution every commit carries. A diff is fully constructed or not
//! at all; there are no partial diffs.

use serde::{Deserialize, Serialize};

use super::domain::ConstraintType;
use super::identity::{MessageId, ProjectId, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintUpsert {
    pub project_id: ProjectId,
    pub key: String,
    pub value: String,
    pub constraint_type: ConstraintType,
    pub reason: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyAdd {
    pub from_project_id: ProjectId,
    pub to_project_id: ProjectId,
    pub reason: String,
}

/// A parsed, typed graph mutation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProposedDiff {
    ConstraintUpsert(ConstraintUpsert),
    DependencyAdd(DependencyAdd),
}

impl ProposedDiff {
    /// The free-text justification carried by both grammars.
    pub fn why(&self) -> &str {
        match self {
            Self::ConstraintUpsert(u) => &u.reason,
            Self::DependencyAdd(d) => &d.reason,
        }
    }

    /// Every project this diff references, in diff order.
    pub fn project_ids(&self) -> Vec<&ProjectId> {
        match self {
            Self::ConstraintUpsert(u) => vec![&u.project_id],
            Self::DependencyAdd(d) => vec![&d.from_project_id, &d.to_project_id],
        }
    }

    /// Derived human-readable one-liner for the ledger entry.
    pub fn commit_message(&self) -> String {
        match self {
            Self::ConstraintUpsert(u) => format!(
                "Set constraint {}={} on {} ({})",
                u.key,
                u.value,
                u.project_id,
                u.constraint_type.as_str()
            ),
            Self::DependencyAdd(d) => {
                format!("Add dependency {} -> {}", d.from_project_id, d.to_project_id)
            }
        }
    }
}

/// Attribution for a diff: who proposed it and through which message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeOrigin {
    pub actor_user_id: UserId,
    pub message_id: MessageId,
    pub permalink: String,
}
