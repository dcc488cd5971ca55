//! Read surface.
//!
//! Read-only projections consumed by external collaborators: current
//! truth, the change feed, project lookup, and the per-project checklist.
//! Reads are unsynchronized with the commit path beyond the store lock;
//! they never observe a partially applied commit.

use std::sync::Arc;

use serde::Serialize;

use crate::core::{
    CommitId, CommitSource, Constraint, ConstraintType, Dependency, GraphCommit, MessageId,
    ProjectId, ProposedDiff, Timestamp, UserId,
};
use crate::store::GraphStore;

#[derive(Debug, Clone, Serialize)]
pub struct ConstraintView {
    pub project_id: ProjectId,
    pub key: String,
    pub value: String,
    pub constraint_type: ConstraintType,
    pub reason: String,
    pub author_user_id: UserId,
    pub source_permalink: String,
    pub created_at: Timestamp,
}

impl From<&Constraint> for ConstraintView {
    fn from(constraint: &Constraint) -> Self {
        Self {
            project_id: constraint.project_id.clone(),
            key: constraint.key.clone(),
            value: constraint.value.clone(),
            constraint_type: constraint.constraint_type,
            reason: constraint.reason.clone(),
            author_user_id: constraint.author_user_id.clone(),
            source_permalink: constraint.source_permalink.clone(),
            created_at: constraint.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DependencyView {
    pub from_project_id: ProjectId,
    pub to_project_id: ProjectId,
    pub reason: String,
    pub author_user_id: UserId,
    pub created_at: Timestamp,
}

impl From<&Dependency> for DependencyView {
    fn from(dependency: &Dependency) -> Self {
        Self {
            from_project_id: dependency.from_project_id.clone(),
            to_project_id: dependency.to_project_id.clone(),
            reason: dependency.reason.clone(),
            author_user_id: dependency.author_user_id.clone(),
            created_at: dependency.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CommitView {
    pub commit_id: CommitId,
    pub sequence_number: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_commit_id: Option<CommitId>,
    pub actor_user_id: UserId,
    pub timestamp: Timestamp,
    pub source: CommitSource,
    pub diff: ProposedDiff,
    pub why: String,
    pub commit_message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_message_id: Option<MessageId>,
}

impl From<&GraphCommit> for CommitView {
    fn from(commit: &GraphCommit) -> Self {
        Self {
            commit_id: commit.commit_id,
            sequence_number: commit.sequence_number,
            parent_commit_id: commit.parent_commit_id,
            actor_user_id: commit.actor_user_id.clone(),
            timestamp: commit.timestamp,
            source: commit.source,
            diff: commit.diff.clone(),
            why: commit.why.clone(),
            commit_message: commit.commit_message.clone(),
            source_message_id: commit.source_message_id.clone(),
        }
    }
}

/// All active constraints and dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentTruth {
    pub constraints: Vec<ConstraintView>,
    pub dependencies: Vec<DependencyView>,
}

/// Commits strictly after `since`, sequence ascending.
#[derive(Debug, Clone, Serialize)]
pub struct ChangeFeed {
    pub since: Timestamp,
    pub commits: Vec<CommitView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProjectView {
    pub project_id: ProjectId,
    pub name: String,
    pub owner_user_ids: Vec<UserId>,
    pub updated_at: Timestamp,
}

/// Active constraints grouped by type plus outgoing active dependencies.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectChecklist {
    pub project: ProjectView,
    pub design_choices: Vec<ConstraintView>,
    pub requirements: Vec<ConstraintView>,
    pub depends_on: Vec<DependencyView>,
}

#[derive(Clone)]
pub struct ReadSurface {
    store: Arc<GraphStore>,
}

impl ReadSurface {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    pub fn current_truth(&self) -> CurrentTruth {
        let state = self.store.read();
        CurrentTruth {
            constraints: state
                .all_active_constraints()
                .into_iter()
                .map(ConstraintView::from)
                .collect(),
            dependencies: state
                .all_active_dependencies()
                .into_iter()
                .map(DependencyView::from)
                .collect(),
        }
    }

    pub fn changes_since(&self, since: Timestamp) -> ChangeFeed {
        let state = self.store.read();
        ChangeFeed {
            since,
            commits: state
                .commits_after(since)
                .into_iter()
                .map(CommitView::from)
                .collect(),
        }
    }

    pub fn project(&self, project_id: &ProjectId) -> Option<ProjectView> {
        let state = self.store.read();
        state.project(project_id).map(|project| ProjectView {
            project_id: project.project_id.clone(),
            name: project.name.clone(),
            owner_user_ids: project.owner_user_ids.iter().cloned().collect(),
            updated_at: project.updated_at,
        })
    }

    pub fn checklist(&self, project_id: &ProjectId) -> Option<ProjectChecklist> {
        let project = self.project(project_id)?;
        let state = self.store.read();

        let mut design_choices = Vec::new();
        let mut requirements = Vec::new();
        for constraint in state.all_active_constraints() {
            if &constraint.project_id != project_id {
                continue;
            }
            match constraint.constraint_type {
                ConstraintType::DesignChoice => design_choices.push(constraint.into()),
                ConstraintType::Requirement => requirements.push(constraint.into()),
            }
        }

        let depends_on = state
            .all_active_dependencies()
            .into_iter()
            .filter(|d| &d.from_project_id == project_id)
            .map(DependencyView::from)
            .collect();

        Some(ProjectChecklist {
            project,
            design_choices,
            requirements,
            depends_on,
        })
    }
}
