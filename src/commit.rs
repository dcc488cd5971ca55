//! Commit sequencer.
//!
//! The sole mutation point of the graph projection. One process-wide lock
//! serializes the read-head / allocate-sequence / append / apply steps, so
//! sequence numbers are dense and strictly increasing and every commit's
//! parent pointer names the previous head. Parsing, idempotency checks,
//! and conflict detection all happen outside this lock.
//!
//! Atomicity discipline: every fallible check runs before the first
//! mutation of the write-guarded state, so a failed commit leaves the
//! ledger and graph untouched.

use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

use crate::core::{
    ChangeOrigin, CommitId, CommitSource, Constraint, ConstraintId, ConstraintKey, Dependency,
    GraphCommit, ProposedDiff, Timestamp,
};
use crate::store::{GraphStore, StoreError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CommitError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A successful commit plus the pre-mutation snapshot the conflict
/// detector compares against (the constraint versions just deactivated;
/// empty on the dependency path).
#[derive(Debug, Clone)]
pub struct CommittedChange {
    pub commit: GraphCommit,
    pub prior_active: Vec<Constraint>,
}

pub struct CommitSequencer {
    store: Arc<GraphStore>,
    /// Guards exactly the critical section of `commit`.
    append_lock: Mutex<()>,
}

impl CommitSequencer {
    pub fn new(store: Arc<GraphStore>) -> Self {
        Self {
            store,
            append_lock: Mutex::new(()),
        }
    }

    /// Append one commit to the ledger and apply its mutation.
    ///
    /// Fails with `TargetNotFound` when a referenced project vanished
    /// between validation and commit; the ledger is unaffected.
    pub fn commit(
        &self,
        diff: ProposedDiff,
        origin: &ChangeOrigin,
    ) -> Result<CommittedChange, CommitError> {
        let _guard = self
            .append_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = Timestamp::now();
        let mut state = self.store.write();

        // Validate every referenced project before mutating anything.
        for project_id in diff.project_ids() {
            if !state.project_exists(project_id) {
                return Err(StoreError::TargetNotFound {
                    project_id: project_id.clone(),
                }
                .into());
            }
        }

        // Read the head and chain onto it. Allocation happens here, inside
        // the critical section, never ahead of it.
        let (sequence_number, parent_commit_id) = match state.head_commit() {
            Some(head) => (head.sequence_number + 1, Some(head.commit_id)),
            None => (1, None),
        };

        let commit_id = CommitId::generate();
        let commit = GraphCommit {
            commit_id,
            sequence_number,
            parent_commit_id,
            actor_user_id: origin.actor_user_id.clone(),
            timestamp: now,
            source: CommitSource::Slack,
            diff: diff.clone(),
            why: diff.why().to_string(),
            commit_message: diff.commit_message(),
            source_message_id: Some(origin.message_id.clone()),
            applies_to: diff.project_ids().into_iter().cloned().collect(),
        };
        state.insert_commit(commit.clone())?;

        // Apply the mutation. Infallible from here on: targets were
        // validated above and insertions cannot collide.
        let prior_active = match &diff {
            ProposedDiff::ConstraintUpsert(upsert) => {
                let key = ConstraintKey::new(upsert.project_id.clone(), upsert.key.clone());
                let prior = state.deactivate_constraints(&key, now);
                state.insert_constraint(Constraint {
                    id: ConstraintId::generate(),
                    project_id: upsert.project_id.clone(),
                    key: upsert.key.clone(),
                    value: upsert.value.clone(),
                    constraint_type: upsert.constraint_type,
                    reason: upsert.reason.clone(),
                    is_active: true,
                    author_user_id: origin.actor_user_id.clone(),
                    source_message_id: origin.message_id.clone(),
                    source_permalink: origin.permalink.clone(),
                    introduced_by: commit_id,
                    created_at: now,
                    deactivated_at: None,
                });
                state.touch_project(&upsert.project_id, now)?;
                prior
            }
            ProposedDiff::DependencyAdd(add) => {
                state.insert_dependency(Dependency {
                    from_project_id: add.from_project_id.clone(),
                    to_project_id: add.to_project_id.clone(),
                    reason: add.reason.clone(),
                    is_active: true,
                    author_user_id: origin.actor_user_id.clone(),
                    source_message_id: origin.message_id.clone(),
                    source_permalink: origin.permalink.clone(),
                    introduced_by: commit_id,
                    created_at: now,
                    deactivated_at: None,
                });
                state.touch_project(&add.from_project_id, now)?;
                state.touch_project(&add.to_project_id, now)?;
                Vec::new()
            }
        };

        tracing::info!(
            %commit_id,
            sequence_number,
            actor = %origin.actor_user_id,
            message = %commit.commit_message,
            "commit appended"
        );

        Ok(CommittedChange {
            commit,
            prior_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::core::{
        ConstraintType, ConstraintUpsert, DependencyAdd, MessageId, Project, ProjectId, UserId,
    };

    fn store_with_projects(ids: &[&str]) -> Arc<GraphStore> {
        let store = Arc::new(GraphStore::new());
        {
            let mut state = store.write();
            for id in ids {
                state.seed_project(Project::new(
                    ProjectId::new(*id).unwrap(),
                    format!("{id} service"),
                    BTreeSet::from([UserId::new("U0").unwrap()]),
                    Timestamp::now(),
                ));
            }
        }
        store
    }

    fn origin(user: &str) -> ChangeOrigin {
        ChangeOrigin {
            actor_user_id: UserId::new(user).unwrap(),
            message_id: MessageId::new(format!("m-{user}")).unwrap(),
            permalink: "https://example.invalid/p".into(),
        }
    }

    fn upsert(project: &str, key: &str, value: &str) -> ProposedDiff {
        ProposedDiff::ConstraintUpsert(ConstraintUpsert {
            project_id: ProjectId::new(project).unwrap(),
            key: key.into(),
            value: value.into(),
            constraint_type: ConstraintType::DesignChoice,
            reason: "because".into(),
        })
    }

    #[test]
    fn first_commit_gets_sequence_one_and_no_parent() {
        let store = store_with_projects(&["api", "web"]);
        let sequencer = CommitSequencer::new(Arc::clone(&store));

        let change = sequencer.commit(upsert("api", "k", "v"), &origin("U1")).unwrap();
        assert_eq!(change.commit.sequence_number, 1);
        assert!(change.commit.parent_commit_id.is_none());
        assert!(change.prior_active.is_empty());
    }

    #[test]
    fn commits_chain_parent_to_previous_head() {
        let store = store_with_projects(&["api", "web"]);
        let sequencer = CommitSequencer::new(Arc::clone(&store));

        let first = sequencer.commit(upsert("api", "k", "v1"), &origin("U1")).unwrap();
        let second = sequencer.commit(upsert("api", "k", "v2"), &origin("U2")).unwrap();

        assert_eq!(second.commit.sequence_number, 2);
        assert_eq!(second.commit.parent_commit_id, Some(first.commit.commit_id));
        // The upsert captured the deactivated prior version.
        assert_eq!(second.prior_active.len(), 1);
        assert_eq!(second.prior_active[0].value, "v1");
        assert_eq!(second.prior_active[0].author_user_id.as_str(), "U1");
    }

    #[test]
    fn unknown_project_leaves_ledger_untouched() {
        let store = store_with_projects(&["api", "web"]);
        let sequencer = CommitSequencer::new(Arc::clone(&store));

        let err = sequencer
            .commit(upsert("ghost", "k", "v"), &origin("U1"))
            .unwrap_err();
        assert!(matches!(
            err,
            CommitError::Store(StoreError::TargetNotFound { .. })
        ));
        assert_eq!(store.read().commit_count(), 0);
    }

    #[test]
    fn dependency_commit_touches_both_projects() {
        let store = store_with_projects(&["api", "web"]);
        let sequencer = CommitSequencer::new(Arc::clone(&store));

        let change = sequencer
            .commit(
                ProposedDiff::DependencyAdd(DependencyAdd {
                    from_project_id: ProjectId::new("web").unwrap(),
                    to_project_id: ProjectId::new("api").unwrap(),
                    reason: "calls it".into(),
                }),
                &origin("U1"),
            )
            .unwrap();

        assert_eq!(change.commit.applies_to.len(), 2);
        let state = store.read();
        let commit_ts = change.commit.timestamp;
        assert_eq!(
            state.project(&ProjectId::new("web").unwrap()).unwrap().updated_at,
            commit_ts
        );
        assert_eq!(
            state.project(&ProjectId::new("api").unwrap()).unwrap().updated_at,
            commit_ts
        );
    }

    #[test]
    fn concurrent_commits_get_dense_distinct_sequences() {
        let store = store_with_projects(&["api", "web"]);
        let sequencer = Arc::new(CommitSequencer::new(Arc::clone(&store)));

        let threads: Vec<_> = (0..8)
            .map(|i| {
                let sequencer = Arc::clone(&sequencer);
                std::thread::spawn(move || {
                    sequencer
                        .commit(upsert("api", &format!("k{i}"), "v"), &origin(&format!("U{i}")))
                        .unwrap()
                        .commit
                        .sequence_number
                })
            })
            .collect();

        let mut sequences: Vec<u64> = threads.into_iter().map(|t| t.join().unwrap()).collect();
        sequences.sort_unstable();
        assert_eq!(sequences, (1..=8).collect::<Vec<u64>>());
    }
}
