//! Layer 6: Conflict reports
//!
//! A conflict is a post-commit condition surfaced for human attention; it
//! never blocks the commit that caused it. Reports are created once,
//! linked to the triggering commit, and never updated.

use serde::{Deserialize, Serialize};

use super::identity::{CommitId, ProjectId, ReportId, UserId};
use super::time::Timestamp;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictType {
    ConstraintConflict,
    DependencyCycle,
}

impl ConflictType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConstraintConflict => "constraint_conflict",
            Self::DependencyCycle => "dependency_cycle",
        }
    }
}

/// Typed detail blob of a detected conflict.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "conflict_type", rename_all = "snake_case")]
pub enum ConflictDetail {
    /// Prior active value(s) differed from the newly committed one: a
    /// silent overwrite of another author's decision.
    ConstraintConflict {
        project_id: ProjectId,
        constraint_key: String,
        new_value: String,
        /// Distinct prior values that differ from the new one, sorted.
        prior_values: Vec<String>,
        /// Authors of those prior values, deduplicated and sorted.
        prior_authors: Vec<UserId>,
    },
    /// The new edge closed a directed cycle through active edges.
    DependencyCycle {
        from_project_id: ProjectId,
        to_project_id: ProjectId,
        /// Witness walk: starts at the new edge's `from` project and ends
        /// back at it. Between equal-length witnesses the choice is
        /// arbitrary.
        cycle_path: Vec<ProjectId>,
    },
}

impl ConflictDetail {
    pub fn conflict_type(&self) -> ConflictType {
        match self {
            Self::ConstraintConflict { .. } => ConflictType::ConstraintConflict,
            Self::DependencyCycle { .. } => ConflictType::DependencyCycle,
        }
    }

    /// Every project referenced by this conflict (used for recipient fan-out).
    pub fn project_ids(&self) -> Vec<&ProjectId> {
        match self {
            Self::ConstraintConflict { project_id, .. } => vec![project_id],
            Self::DependencyCycle {
                from_project_id,
                to_project_id,
                cycle_path,
            } => {
                let mut ids = vec![from_project_id, to_project_id];
                ids.extend(cycle_path.iter());
                ids
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub report_id: ReportId,
    pub conflict_type: ConflictType,
    pub detail: ConflictDetail,
    /// The commit that triggered detection.
    pub commit_id: CommitId,
    pub created_at: Timestamp,
}

impl ConflictReport {
    pub fn new(detail: ConflictDetail, commit_id: CommitId, created_at: Timestamp) -> Self {
        Self {
            report_id: ReportId::generate(),
            conflict_type: detail.conflict_type(),
            detail,
            commit_id,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_serializes_with_conflict_type_tag() {
        let detail = ConflictDetail::ConstraintConflict {
            project_id: ProjectId::new("api").unwrap(),
            constraint_key: "storage".into(),
            new_value: "postgres".into(),
            prior_values: vec!["sqlite".into()],
            prior_authors: vec![UserId::new("U1").unwrap()],
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["conflict_type"], "constraint_conflict");
        assert_eq!(json["prior_values"][0], "sqlite");
    }
}
