//! The graph store projection.
//!
//! Current truth is a derived projection over the immutable ledger:
//! constraints and dependencies are never edited in place, only
//! deactivated and re-created. `GraphState` is the single source of truth
//! for nodes, edges, messages, commits, and reports; `GraphStore` wraps it
//! in a read/write lock so readers never observe a partially applied
//! commit.
//!
//! Uniqueness enforced structurally (the analog of the one-time schema
//! migration): project id, message id, event id, commit id, sequence
//! number. Active-constraint lookup is keyed by `(project_id, key)`; an
//! adjacency index mirrors the active-edge subgraph for cycle searches.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;

use crate::core::{
    CommitId, ConflictReport, Constraint, ConstraintKey, Dependency, DependencyKey, EventId,
    GraphCommit, IngestionStatus, MessageId, Project, ProjectId, SlackMessage, Timestamp,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreError {
    /// A referenced project does not exist in the graph.
    #[error("project `{project_id}` not found")]
    TargetNotFound { project_id: ProjectId },

    #[error("message `{message_id}` already recorded")]
    DuplicateMessage { message_id: MessageId },

    #[error("event `{event_id}` already recorded")]
    DuplicateEvent { event_id: EventId },

    #[error("sequence number {sequence_number} already allocated")]
    DuplicateSequence { sequence_number: u64 },

    #[error("commit `{commit_id}` already recorded")]
    DuplicateCommit { commit_id: CommitId },
}

/// All graph state, owned exclusively by the store lock.
#[derive(Debug, Default)]
pub struct GraphState {
    projects: BTreeMap<ProjectId, Project>,
    /// Constraint version history per `(project_id, key)`, append order.
    constraints: BTreeMap<ConstraintKey, Vec<Constraint>>,
    /// Dependency edge history per `(from, to)`, append order.
    dependencies: BTreeMap<DependencyKey, Vec<Dependency>>,
    /// Active-edge adjacency, mirrored incrementally for traversal.
    out_edges: BTreeMap<ProjectId, BTreeSet<ProjectId>>,
    /// The ledger, keyed by sequence number; the last entry is the head.
    commits: BTreeMap<u64, GraphCommit>,
    commit_ids: BTreeSet<CommitId>,
    messages: BTreeMap<MessageId, SlackMessage>,
    event_index: BTreeMap<EventId, MessageId>,
    reports: Vec<ConflictReport>,
}

impl GraphState {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Projects
    // =========================================================================

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.get(id)
    }

    pub fn project_exists(&self, id: &ProjectId) -> bool {
        self.projects.contains_key(id)
    }

    /// Insert a project if absent. Returns true when created. Existing
    /// projects are left untouched (bootstrap is additive only).
    pub fn seed_project(&mut self, project: Project) -> bool {
        match self.projects.entry(project.project_id.clone()) {
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(project);
                true
            }
            std::collections::btree_map::Entry::Occupied(_) => false,
        }
    }

    pub fn touch_project(&mut self, id: &ProjectId, at: Timestamp) -> Result<(), StoreError> {
        match self.projects.get_mut(id) {
            Some(project) => {
                project.touch(at);
                Ok(())
            }
            None => Err(StoreError::TargetNotFound {
                project_id: id.clone(),
            }),
        }
    }

    // =========================================================================
    // Ledger
    // =========================================================================

    pub fn head_commit(&self) -> Option<&GraphCommit> {
        self.commits.values().next_back()
    }

    pub fn commit_count(&self) -> usize {
        self.commits.len()
    }

    pub fn commits(&self) -> impl Iterator<Item = &GraphCommit> {
        self.commits.values()
    }

    /// Commits strictly after `since`, in sequence order.
    pub fn commits_after(&self, since: Timestamp) -> Vec<&GraphCommit> {
        self.commits
            .values()
            .filter(|commit| commit.timestamp > since)
            .collect()
    }

    pub fn insert_commit(&mut self, commit: GraphCommit) -> Result<(), StoreError> {
        if self.commits.contains_key(&commit.sequence_number) {
            return Err(StoreError::DuplicateSequence {
                sequence_number: commit.sequence_number,
            });
        }
        if !self.commit_ids.insert(commit.commit_id) {
            return Err(StoreError::DuplicateCommit {
                commit_id: commit.commit_id,
            });
        }
        self.commits.insert(commit.sequence_number, commit);
        Ok(())
    }

    // =========================================================================
    // Constraints
    // =========================================================================

    pub fn active_constraints(&self, key: &ConstraintKey) -> Vec<&Constraint> {
        self.constraints
            .get(key)
            .into_iter()
            .flatten()
            .filter(|c| c.is_active)
            .collect()
    }

    /// No-op check: is this exact `(project, key, value)` already active?
    pub fn constraint_value_is_active(&self, key: &ConstraintKey, value: &str) -> bool {
        self.active_constraints(key)
            .iter()
            .any(|c| c.value == value)
    }

    /// Deactivate every active version under `key`, returning the
    /// deactivated versions (the pre-mutation snapshot the conflict
    /// detector compares against).
    pub fn deactivate_constraints(&mut self, key: &ConstraintKey, at: Timestamp) -> Vec<Constraint> {
        let mut prior = Vec::new();
        if let Some(versions) = self.constraints.get_mut(key) {
            for version in versions.iter_mut().filter(|c| c.is_active) {
                version.deactivate(at);
                prior.push(version.clone());
            }
        }
        prior
    }

    pub fn insert_constraint(&mut self, constraint: Constraint) {
        self.constraints
            .entry(constraint.lookup_key())
            .or_default()
            .push(constraint);
    }

    pub fn all_active_constraints(&self) -> Vec<&Constraint> {
        self.constraints
            .values()
            .flatten()
            .filter(|c| c.is_active)
            .collect()
    }

    // =========================================================================
    // Dependencies
    // =========================================================================

    /// No-op check: is this exact `(from, to)` edge already active?
    pub fn dependency_is_active(&self, key: &DependencyKey) -> bool {
        self.out_edges
            .get(&key.from)
            .is_some_and(|targets| targets.contains(&key.to))
    }

    pub fn insert_dependency(&mut self, dependency: Dependency) {
        if dependency.is_active {
            self.out_edges
                .entry(dependency.from_project_id.clone())
                .or_default()
                .insert(dependency.to_project_id.clone());
        }
        self.dependencies
            .entry(dependency.key())
            .or_default()
            .push(dependency);
    }

    /// Active-edge neighbors of `from`, for traversal.
    pub fn active_out_edges(&self, from: &ProjectId) -> impl Iterator<Item = &ProjectId> {
        self.out_edges.get(from).into_iter().flatten()
    }

    pub fn all_active_dependencies(&self) -> Vec<&Dependency> {
        self.dependencies
            .values()
            .flatten()
            .filter(|d| d.is_active)
            .collect()
    }

    // =========================================================================
    // Messages
    // =========================================================================

    pub fn message(&self, id: &MessageId) -> Option<&SlackMessage> {
        self.messages.get(id)
    }

    pub fn insert_message(&mut self, message: SlackMessage) -> Result<(), StoreError> {
        if self.messages.contains_key(&message.message_id) {
            return Err(StoreError::DuplicateMessage {
                message_id: message.message_id.clone(),
            });
        }
        if let Some(event_id) = &message.event_id {
            if self.event_index.contains_key(event_id) {
                return Err(StoreError::DuplicateEvent {
                    event_id: event_id.clone(),
                });
            }
            self.event_index
                .insert(event_id.clone(), message.message_id.clone());
        }
        self.messages.insert(message.message_id.clone(), message);
        Ok(())
    }

    /// Re-stamp an existing record. Returns false when no record exists.
    pub fn stamp_message(
        &mut self,
        id: &MessageId,
        status: IngestionStatus,
        reason: Option<String>,
    ) -> bool {
        match self.messages.get_mut(id) {
            Some(message) => {
                message.stamp(status, reason);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Conflict reports
    // =========================================================================

    pub fn push_report(&mut self, report: ConflictReport) {
        self.reports.push(report);
    }

    pub fn reports(&self) -> &[ConflictReport] {
        &self.reports
    }

    pub fn reports_for_commit(&self, commit_id: &CommitId) -> Vec<&ConflictReport> {
        self.reports
            .iter()
            .filter(|report| &report.commit_id == commit_id)
            .collect()
    }
}

/// Shared handle over the graph state.
///
/// Lock poisoning is recovered by taking the inner state: a writer that
/// panicked cannot have left a partially applied commit because every
/// commit validates before it mutates.
#[derive(Debug, Default)]
pub struct GraphStore {
    state: RwLock<GraphState>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read(&self) -> RwLockReadGuard<'_, GraphState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, GraphState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}
