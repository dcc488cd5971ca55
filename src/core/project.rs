//! Layer 3: Project nodes
//!
//! Projects are externally configured (the static registry) and seeded by
//! the bootstrap path. The commit pipeline never creates or removes them;
//! it only touches `updated_at` when a commit mutates their subgraph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::identity::{ProjectId, UserId};
use super::time::Timestamp;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project_id: ProjectId,
    pub name: String,
    pub owner_user_ids: BTreeSet<UserId>,
    pub updated_at: Timestamp,
}

impl Project {
    pub fn new(
        project_id: ProjectId,
        name: impl Into<String>,
        owner_user_ids: BTreeSet<UserId>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            project_id,
            name: name.into(),
            owner_user_ids,
            updated_at: created_at,
        }
    }

    /// Stamp the project as affected by a commit.
    pub fn touch(&mut self, at: Timestamp) {
        self.updated_at = at;
    }
}
