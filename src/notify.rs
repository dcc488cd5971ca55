//! Notification payload construction.
//!
//! Pure computation: no delivery happens here. A commit with conflicts
//! yields a conflict notification naming the recipient set; a clean commit
//! yields a plain acknowledgement.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::commit::CommittedChange;
use crate::core::{CommitId, ConflictDetail, ConflictReport, ProjectId, UserId};

pub const NOTIFICATION_CONFLICT_DETECTED: &str = "conflict_detected";

/// Flat payload handed to the (external) delivery channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictNotification {
    pub notification_type: &'static str,
    pub commit_id: CommitId,
    pub sequence_number: u64,
    pub actor_user_id: UserId,
    /// Deduplicated and sorted.
    pub recipient_user_ids: Vec<UserId>,
    /// The detected conflicts, verbatim.
    pub conflicts: Vec<ConflictDetail>,
}

/// Acknowledgement for a conflict-free commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitAck {
    pub commit_id: CommitId,
    pub projects: Vec<ProjectId>,
    pub commit_message: String,
}

/// What the pipeline reports back after a successful commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum CommitNotice {
    Conflicts(ConflictNotification),
    Ack(CommitAck),
}

/// Compute the post-commit notice.
///
/// Recipients = acting user ∪ owner sets of every project referenced by
/// any conflict ∪ every author named in a constraint conflict's
/// differing-prior-authors list.
pub fn build_notice(
    change: &CommittedChange,
    reports: &[ConflictReport],
    owner_sets: &BTreeMap<ProjectId, BTreeSet<UserId>>,
) -> CommitNotice {
    if reports.is_empty() {
        return CommitNotice::Ack(CommitAck {
            commit_id: change.commit.commit_id,
            projects: change.commit.applies_to.clone(),
            commit_message: change.commit.commit_message.clone(),
        });
    }

    let mut recipients: BTreeSet<UserId> = BTreeSet::new();
    recipients.insert(change.commit.actor_user_id.clone());

    for report in reports {
        for project_id in report.detail.project_ids() {
            if let Some(owners) = owner_sets.get(project_id) {
                recipients.extend(owners.iter().cloned());
            }
        }
        if let ConflictDetail::ConstraintConflict { prior_authors, .. } = &report.detail {
            recipients.extend(prior_authors.iter().cloned());
        }
    }

    CommitNotice::Conflicts(ConflictNotification {
        notification_type: NOTIFICATION_CONFLICT_DETECTED,
        commit_id: change.commit.commit_id,
        sequence_number: change.commit.sequence_number,
        actor_user_id: change.commit.actor_user_id.clone(),
        recipient_user_ids: recipients.into_iter().collect(),
        conflicts: reports.iter().map(|r| r.detail.clone()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        CommitSource, ConstraintType, ConstraintUpsert, GraphCommit, ProposedDiff, Timestamp,
    };

    fn pid(id: &str) -> ProjectId {
        ProjectId::new(id).unwrap()
    }

    fn uid(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn change(actor: &str) -> CommittedChange {
        CommittedChange {
            commit: GraphCommit {
                commit_id: CommitId::generate(),
                sequence_number: 7,
                parent_commit_id: Some(CommitId::generate()),
                actor_user_id: uid(actor),
                timestamp: Timestamp::now(),
                source: CommitSource::Slack,
                diff: ProposedDiff::ConstraintUpsert(ConstraintUpsert {
                    project_id: pid("api"),
                    key: "storage".into(),
                    value: "postgres".into(),
                    constraint_type: ConstraintType::DesignChoice,
                    reason: "newer thinking".into(),
                }),
                why: "newer thinking".into(),
                commit_message: "Set constraint storage=postgres on api (design_choice)".into(),
                source_message_id: None,
                applies_to: vec![pid("api")],
            },
            prior_active: Vec::new(),
        }
    }

    #[test]
    fn no_conflicts_builds_an_ack() {
        let owners = BTreeMap::new();
        let notice = build_notice(&change("U2"), &[], &owners);
        let CommitNotice::Ack(ack) = notice else {
            panic!("expected ack");
        };
        assert_eq!(ack.projects, vec![pid("api")]);
        assert!(ack.commit_message.contains("storage=postgres"));
    }

    #[test]
    fn recipients_union_actor_owners_and_prior_authors() {
        let change = change("U2");
        let report = ConflictReport::new(
            ConflictDetail::ConstraintConflict {
                project_id: pid("api"),
                constraint_key: "storage".into(),
                new_value: "postgres".into(),
                prior_values: vec!["sqlite".into()],
                prior_authors: vec![uid("U1")],
            },
            change.commit.commit_id,
            Timestamp::now(),
        );
        let owner_sets =
            BTreeMap::from([(pid("api"), BTreeSet::from([uid("U9"), uid("U2")]))]);

        let CommitNotice::Conflicts(notification) =
            build_notice(&change, &[report], &owner_sets)
        else {
            panic!("expected conflict notification");
        };

        // Deduplicated (U2 is actor and owner) and sorted.
        assert_eq!(
            notification.recipient_user_ids,
            vec![uid("U1"), uid("U2"), uid("U9")]
        );
        assert_eq!(notification.sequence_number, 7);
        assert_eq!(notification.notification_type, NOTIFICATION_CONFLICT_DETECTED);
        assert_eq!(notification.conflicts.len(), 1);
    }

    #[test]
    fn cycle_conflict_fans_out_to_every_path_project() {
        let change = change("U2");
        let report = ConflictReport::new(
            ConflictDetail::DependencyCycle {
                from_project_id: pid("c"),
                to_project_id: pid("a"),
                cycle_path: vec![pid("c"), pid("a"), pid("b"), pid("c")],
            },
            change.commit.commit_id,
            Timestamp::now(),
        );
        let owner_sets = BTreeMap::from([
            (pid("a"), BTreeSet::from([uid("UA")])),
            (pid("b"), BTreeSet::from([uid("UB")])),
            (pid("c"), BTreeSet::from([uid("UC")])),
        ]);

        let CommitNotice::Conflicts(notification) =
            build_notice(&change, &[report], &owner_sets)
        else {
            panic!("expected conflict notification");
        };
        assert_eq!(
            notification.recipient_user_ids,
            vec![uid("U2"), uid("UA"), uid("UB"), uid("UC")]
        );
    }
}
