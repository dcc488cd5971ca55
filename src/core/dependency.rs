//! Layer 3: Dependency edges
//!
//! A dependency is a directed, attributed edge between two projects.
//! Edges are never deleted; deactivation is the only mutation path, and
//! the commit pipeline only ever activates.

use serde::{Deserialize, Serialize};

use super::identity::{CommitId, MessageId, ProjectId, UserId};
use super::time::Timestamp;

/// Edge identity tuple.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyKey {
    pub from: ProjectId,
    pub to: ProjectId,
}

impl DependencyKey {
    pub fn new(from: ProjectId, to: ProjectId) -> Self {
        Self { from, to }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from_project_id: ProjectId,
    pub to_project_id: ProjectId,
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

impl Dependency {
    pub fn key(&self) -> DependencyKey {
        DependencyKey::new(self.from_project_id.clone(), self.to_project_id.clone())
    }
}
