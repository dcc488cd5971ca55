//! Post-commit conflict detection.
//!
//! Runs once per successful commit, read-only, outside the commit lock.
//! A commit may produce zero, one, or two reports; detection never blocks
//! or undoes the commit that triggered it.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use crate::commit::CommittedChange;
use crate::core::{ConflictDetail, ConflictReport, ProjectId, ProposedDiff, Timestamp};
use crate::store::{GraphState, GraphStore};

pub struct ConflictDetector {
    store: Arc<GraphStore>,
}

impl ConflictDetector {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self { store }
    }

    /// Detect conflicts caused by `change` and persist one report per
    /// finding, linked to the commit.
    pub fn detect_after_commit(&self, change: &CommittedChange) -> Vec<ConflictReport> {
        let mut details = Vec::new();

        if let Some(detail) = constraint_conflict(change) {
            details.push(detail);
        }
        if let Some(detail) = dependency_cycle(&self.store.read(), &change.commit.diff) {
            details.push(detail);
        }

        let now = Timestamp::now();
        let reports: Vec<ConflictReport> = details
            .into_iter()
            .map(|detail| ConflictReport::new(detail, change.commit.commit_id, now))
            .collect();

        if !reports.is_empty() {
            let mut state = self.store.write();
            for report in &reports {
                tracing::warn!(
                    commit_id = %report.commit_id,
                    conflict_type = report.conflict_type.as_str(),
                    "conflict detected"
                );
                state.push_report(report.clone());
            }
        }
        reports
    }
}

/// Did this upsert silently overwrite a differing prior value?
///
/// Compares against the versions the commit just deactivated, not live
/// state, so a racing later upsert cannot mask the overwrite.
fn constraint_conflict(change: &CommittedChange) -> Option<ConflictDetail> {
    let ProposedDiff::ConstraintUpsert(upsert) = &change.commit.diff else {
        return None;
    };

    let mut prior_values = BTreeSet::new();
    let mut prior_authors = BTreeSet::new();
    for prior in &change.prior_active {
        if prior.value != upsert.value {
            prior_values.insert(prior.value.clone());
            prior_authors.insert(prior.author_user_id.clone());
        }
    }
    if prior_values.is_empty() {
        return None;
    }

    Some(ConflictDetail::ConstraintConflict {
        project_id: upsert.project_id.clone(),
        constraint_key: upsert.key.clone(),
        new_value: upsert.value.clone(),
        prior_values: prior_values.into_iter().collect(),
        prior_authors: prior_authors.into_iter().collect(),
    })
}

/// Did this edge close a directed cycle through active edges?
///
/// Searches for the shortest path `to -> ... -> from`; its existence means
/// the new edge completed a cycle. The reported walk starts at the new
/// edge's `from` project and ends back at it.
fn dependency_cycle(state: &GraphState, diff: &ProposedDiff) -> Option<ConflictDetail> {
    let ProposedDiff::DependencyAdd(add) = diff else {
        return None;
    };

    let path = shortest_active_path(state, &add.to_project_id, &add.from_project_id)?;
    let mut cycle_path = Vec::with_capacity(path.len() + 1);
    cycle_path.push(add.from_project_id.clone());
    cycle_path.extend(path);

    Some(ConflictDetail::DependencyCycle {
        from_project_id: add.from_project_id.clone(),
        to_project_id: add.to_project_id.clone(),
        cycle_path,
    })
}

/// Breadth-first search over the active-edge subgraph.
///
/// Returns the node list `start ..= target`, or `None` when unreachable.
/// Equal-length witnesses tie-break on adjacency order; callers only rely
/// on existence and one witness.
fn shortest_active_path(
    state: &GraphState,
    start: &ProjectId,
    target: &ProjectId,
) -> Option<Vec<ProjectId>> {
    if start == target {
        return Some(vec![start.clone()]);
    }

    let mut parents: BTreeMap<ProjectId, ProjectId> = BTreeMap::new();
    let mut queue = VecDeque::from([start.clone()]);

    while let Some(current) = queue.pop_front() {
        for next in state.active_out_edges(&current) {
            if next == start || parents.contains_key(next) {
                continue;
            }
            parents.insert(next.clone(), current.clone());
            if next == target {
                let mut path = vec![target.clone()];
                let mut node = target;
                while let Some(parent) = parents.get(node) {
                    path.push(parent.clone());
                    node = parent;
                }
                path.reverse();
                return Some(path);
            }
            queue.push_back(next.clone());
        }
    }
    None
}
