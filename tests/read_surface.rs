//! Read-surface tests: current truth, change feed, project lookup, and
//! checklist projections over committed state.

mod fixtures;

use dendrite::core::{ProjectId, Timestamp};
use dendrite::read::ReadSurface;
use dendrite::service::IngestOutcome;

use fixtures::{message, service};

fn pid(id: &str) -> ProjectId {
    ProjectId::new(id).unwrap()
}

#[test]
fn current_truth_shows_only_active_state() {
    let (store, service) = service();
    service.handle_envelope(message(
        "Ev1",
        "1.1",
        "U1",
        "project: api constraint: storage=sqlite why: simple",
    ));
    service.handle_envelope(message(
        "Ev2",
        "1.2",
        "U2",
        "project: api constraint: storage=postgres why: durability",
    ));
    service.handle_envelope(message("Ev3", "1.3", "U1", "project: web depends_on: api why: calls"));

    let read = ReadSurface::new(std::sync::Arc::clone(&store));
    let truth = read.current_truth();
    // The sqlite version was deactivated by the upsert.
    assert_eq!(truth.constraints.len(), 1);
    assert_eq!(truth.constraints[0].value, "postgres");
    assert_eq!(truth.dependencies.len(), 1);
    assert_eq!(truth.dependencies[0].from_project_id, pid("web"));
}

#[test]
fn change_feed_is_strictly_after_and_sequence_ordered() {
    let (store, service) = service();
    service.handle_envelope(message(
        "Ev1",
        "1.1",
        "U1",
        "project: api constraint: storage=postgres why: durability",
    ));
    service.handle_envelope(message("Ev2", "1.2", "U1", "project: web depends_on: api why: calls"));

    let read = ReadSurface::new(std::sync::Arc::clone(&store));

    let epoch = Timestamp::parse("1970-01-01T00:00:00Z").unwrap();
    let feed = read.changes_since(epoch);
    assert_eq!(feed.commits.len(), 2);
    assert!(feed.commits[0].sequence_number < feed.commits[1].sequence_number);

    // The boundary is exclusive: a commit's own timestamp yields nothing
    // newer than it except commits stamped strictly later.
    let head_ts = store.read().head_commit().unwrap().timestamp;
    let after_head = read.changes_since(head_ts);
    assert!(after_head.commits.is_empty());
}

#[test]
fn project_lookup_and_checklist_group_by_type() {
    let (store, service) = service();
    service.handle_envelope(message(
        "Ev1",
        "1.1",
        "U1",
        "project: api constraint: storage=postgres type: Requirement why: durability",
    ));
    service.handle_envelope(message(
        "Ev2",
        "1.2",
        "U1",
        "project: api constraint: style=rest why: convention",
    ));
    service.handle_envelope(message("Ev3", "1.3", "U1", "project: api depends_on: infra why: runs on it"));

    let read = ReadSurface::new(std::sync::Arc::clone(&store));

    let project = read.project(&pid("api")).unwrap();
    assert_eq!(project.name, "API service");
    assert_eq!(
        project
            .owner_user_ids
            .iter()
            .map(|u| u.as_str())
            .collect::<Vec<_>>(),
        vec!["UAPI1", "UAPI2"]
    );

    let checklist = read.checklist(&pid("api")).unwrap();
    assert_eq!(checklist.requirements.len(), 1);
    assert_eq!(checklist.requirements[0].key, "storage");
    assert_eq!(checklist.design_choices.len(), 1);
    assert_eq!(checklist.design_choices[0].key, "style");
    assert_eq!(checklist.depends_on.len(), 1);
    assert_eq!(checklist.depends_on[0].to_project_id, pid("infra"));

    assert!(read.project(&pid("ghost")).is_none());
    assert!(read.checklist(&pid("ghost")).is_none());
}

#[test]
fn commits_touch_project_updated_at() {
    let (store, service) = service();
    let before = store.read().project(&pid("api")).unwrap().updated_at;

    let outcome = service.handle_envelope(message(
        "Ev1",
        "1.1",
        "U1",
        "project: api constraint: storage=postgres why: durability",
    ));
    assert!(matches!(outcome, IngestOutcome::Committed { .. }));

    let after = store.read().project(&pid("api")).unwrap().updated_at;
    assert!(after >= before);
    assert_eq!(after, store.read().head_commit().unwrap().timestamp);
}

#[test]
fn bootstrap_is_additive_and_idempotent() {
    let (_, service) = service();
    // The fixture already bootstrapped once.
    let summary = service.bootstrap();
    assert_eq!(summary.created, 0);
    assert_eq!(summary.existing, 3);
}
