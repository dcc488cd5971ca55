//! Layer 3: Constraint versions
//!
//! A constraint is a versioned value cell: every change creates a new node
//! and deactivates the prior active ones. At most one version per
//! `(project_id, key)` is active at any time; history is never edited.

use serde::{Deserialize, Serialize};

use super::domain::ConstraintType;
use super::identity::{CommitId, ConstraintId, MessageId, ProjectId, UserId};
use super::time::Timestamp;

/// Lookup key for the one-active-version invariant.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConstraintKey {
    pub project_id: ProjectId,
    pub key: String,
}

impl ConstraintKey {
    pub fn new(project_id: ProjectId, key: impl Into<String>) -> Self {
        Self {
            project_id,
            key: key.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub id: ConstraintId,
    pub project_id: ProjectId,
    pub key: String,
    pub value: String,
    pub constraint_type: ConstraintType,
    pub reason: String,
    pub is_active: bool,
    pub author_user_id: UserId,
    pub source_message_id: MessageId,
    pub source_permalink: String,
    pub introduced_by: CommitId,
    pub created_at: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deactivated_at: Option<Timestamp>,
}

impl Constraint {
    /// Deactivate this version. Active state is mutated exactly once.
    pub fn deactivate(&mut self, at: Timestamp) {
        self.is_active = false;
        self.deactivated_at = Some(at);
    }

    pub fn lookup_key(&self) -> ConstraintKey {
        ConstraintKey::new(self.project_id.clone(), self.key.clone())
    }
}
