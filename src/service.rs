//! The commit pipeline.
//!
//! Wires the gate, parser, no-op filter, sequencer, detector, and
//! notification builder into one entry point: `handle_envelope`. Every
//! terminal classification is a value in `IngestOutcome`; nothing in the
//! pipeline retries, and upstream redelivery is absorbed by the gate.

use std::sync::Arc;

use serde::Serialize;

use crate::commit::CommitSequencer;
use crate::config::RegistryConfig;
use crate::conflicts::ConflictDetector;
use crate::core::{
    ChangeOrigin, ConstraintKey, DependencyKey, IngestionStatus, MessageId, Project, ProjectId,
    ProposedDiff, Timestamp,
};
use crate::ingest::{GateDecision, IngestionGate, REASON_UNSUPPORTED_EVENT};
use crate::notify::{build_notice, CommitNotice};
use crate::parse;
use crate::slack::events::InboundEnvelope;
use crate::slack::permalink::PermalinkSource;
use crate::store::GraphStore;

pub const REASON_CONSTRAINT_ALREADY_ACTIVE: &str = "constraint_already_active";
pub const REASON_DEPENDENCY_ALREADY_ACTIVE: &str = "dependency_already_active";

/// Terminal result of one inbound envelope, serialized as the webhook
/// response body.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum IngestOutcome {
    /// `url_verification` handshake: echo the challenge.
    Challenge { challenge: String },
    Ignored { reason: String },
    Duplicate { message_id: MessageId },
    InvalidPayload { reason: String },
    /// Plain, non-mutating message: summary + hashtag entities.
    Plain {
        summary: String,
        entities: Vec<String>,
    },
    /// Structured attempt that failed a grammar.
    ParseFailed { expected: String },
    /// Diff referenced project ids absent from the registry.
    UnknownProject {
        unknown_project_ids: Vec<ProjectId>,
        valid_project_ids: Vec<ProjectId>,
    },
    /// Intended mutation already holds; ledger untouched.
    NoOp {
        message_id: MessageId,
        reason: String,
    },
    Committed { notice: CommitNotice },
    /// Referenced project vanished between validation and commit.
    CommitFailed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BootstrapSummary {
    pub created: usize,
    pub existing: usize,
}

pub struct ChangeService {
    registry: RegistryConfig,
    store: Arc<GraphStore>,
    gate: IngestionGate,
    sequencer: CommitSequencer,
    detector: ConflictDetector,
}

impl ChangeService {
    pub fn new(
        registry: RegistryConfig,
        store: Arc<GraphStore>,
        permalinks: Arc<dyn PermalinkSource>,
    ) -> Self {
        let gate = IngestionGate::new(
            Arc::clone(&store),
            registry.channel_id().clone(),
            permalinks,
        );
        let sequencer = CommitSequencer::new(Arc::clone(&store));
        let detector = ConflictDetector::new(Arc::clone(&store));
        Self {
            registry,
            store,
            gate,
            sequencer,
            detector,
        }
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    pub fn registry(&self) -> &RegistryConfig {
        &self.registry
    }

    /// Seed the registry's projects into the graph. Additive only:
    /// existing projects are never modified or removed.
    pub fn bootstrap(&self) -> BootstrapSummary {
        let now = Timestamp::now();
        let mut created = 0;
        let mut existing = 0;
        let mut state = self.store.write();
        for entry in &self.registry.projects {
            let project = Project::new(
                entry.project_id.clone(),
                entry.name.clone(),
                entry.owner_user_ids.iter().cloned().collect(),
                now,
            );
            if state.seed_project(project) {
                created += 1;
            } else {
                existing += 1;
            }
        }
        tracing::info!(created, existing, "bootstrap seeded registry projects");
        BootstrapSummary { created, existing }
    }

    /// Run one envelope through the whole pipeline.
    pub fn handle_envelope(&self, envelope: InboundEnvelope) -> IngestOutcome {
        if envelope.is_url_verification() {
            return IngestOutcome::Challenge {
                challenge: envelope.challenge.unwrap_or_default(),
            };
        }

        let (message_id, event, permalink) = match self.gate.admit(&envelope) {
            GateDecision::NotAMessage => {
                return IngestOutcome::Ignored {
                    reason: REASON_UNSUPPORTED_EVENT.to_string(),
                }
            }
            GateDecision::Duplicate { message_id } => {
                return IngestOutcome::Duplicate { message_id }
            }
            GateDecision::Ignored { reason } => {
                return IngestOutcome::Ignored {
                    reason: reason.to_string(),
                }
            }
            GateDecision::InvalidPayload { reason } => {
                return IngestOutcome::InvalidPayload { reason }
            }
            GateDecision::Accepted {
                message_id,
                event,
                permalink,
            } => (message_id, event, permalink),
        };

        // Plain messages never reach the grammars.
        if !parse::is_structured_attempt(&event.text) {
            let plain = parse::parse_plain(&event.text);
            return IngestOutcome::Plain {
                summary: plain.summary,
                entities: plain.entities,
            };
        }

        let diff = match parse::parse_diff(&event.text) {
            Ok(diff) => diff,
            Err(err) => {
                self.gate.stamp(
                    &message_id,
                    IngestionStatus::Error,
                    Some(format!("parse_failure: {}", err.template())),
                );
                return IngestOutcome::ParseFailed {
                    expected: err.template().to_string(),
                };
            }
        };

        // Registry validation: unknown ids are a hard failure distinct
        // from parse failure, and surface the full set of valid ids.
        let unknown: Vec<ProjectId> = diff
            .project_ids()
            .into_iter()
            .filter(|id| !self.registry.contains(id))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            let listed = unknown
                .iter()
                .map(ProjectId::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            self.gate.stamp(
                &message_id,
                IngestionStatus::InvalidUnknownProject,
                Some(format!("unknown_project: {listed}")),
            );
            return IngestOutcome::UnknownProject {
                unknown_project_ids: unknown,
                valid_project_ids: self.registry.project_ids(),
            };
        }

        // No-op filter: advisory read outside the commit lock.
        if let Some(reason) = self.no_op_reason(&diff) {
            self.gate.stamp(
                &message_id,
                IngestionStatus::NoOpDuplicate,
                Some(reason.to_string()),
            );
            return IngestOutcome::NoOp {
                message_id,
                reason: reason.to_string(),
            };
        }

        let origin = ChangeOrigin {
            actor_user_id: event.user.clone(),
            message_id: message_id.clone(),
            permalink,
        };
        let change = match self.sequencer.commit(diff, &origin) {
            Ok(change) => change,
            Err(err) => {
                self.gate.stamp(
                    &message_id,
                    IngestionStatus::Error,
                    Some(format!("commit_failed: {err}")),
                );
                return IngestOutcome::CommitFailed {
                    reason: err.to_string(),
                };
            }
        };

        let reports = self.detector.detect_after_commit(&change);
        let notice = build_notice(&change, &reports, &self.registry.owner_sets());
        IngestOutcome::Committed { notice }
    }

    /// Would this diff change current active state at all?
    fn no_op_reason(&self, diff: &ProposedDiff) -> Option<&'static str> {
        let state = self.store.read();
        match diff {
            ProposedDiff::ConstraintUpsert(upsert) => {
                let key = ConstraintKey::new(upsert.project_id.clone(), upsert.key.clone());
                state
                    .constraint_value_is_active(&key, &upsert.value)
                    .then_some(REASON_CONSTRAINT_ALREADY_ACTIVE)
            }
            ProposedDiff::DependencyAdd(add) => {
                let key =
                    DependencyKey::new(add.from_project_id.clone(), add.to_project_id.clone());
                state
                    .dependency_is_active(&key)
                    .then_some(REASON_DEPENDENCY_ALREADY_ACTIVE)
            }
        }
    }
}
