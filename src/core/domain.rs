//! Layer 2: Domain enums
//!
//! ConstraintType: design_choice, requirement
//! CommitSource: slack
//! IngestionStatus: terminal states of the message ingestion state machine

use serde::{Deserialize, Serialize};

/// Constraint classification.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintType {
    DesignChoice,
    Requirement,
}

impl ConstraintType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DesignChoice => "design_choice",
            Self::Requirement => "requirement",
        }
    }
}

impl Default for ConstraintType {
    fn default() -> Self {
        Self::DesignChoice
    }
}

/// Where a commit originated.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitSource {
    Slack,
}

impl CommitSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slack => "slack",
        }
    }
}

/// Terminal status of an ingested message.
///
/// Transition order is owned by the ingestion gate; a record is created on
/// first sight of a message id and afterwards only re-stamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IngestionStatus {
    Processed,
    Ignored,
    NoOpDuplicate,
    InvalidUnknownProject,
    Error,
}

impl IngestionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Ignored => "ignored",
            Self::NoOpDuplicate => "no_op_duplicate",
            Self::InvalidUnknownProject => "invalid_unknown_project",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_are_snake_case() {
        assert_eq!(
            serde_json::to_string(&ConstraintType::DesignChoice).unwrap(),
            "\"design_choice\""
        );
        assert_eq!(
            serde_json::to_string(&IngestionStatus::NoOpDuplicate).unwrap(),
            "\"no_op_duplicate\""
        );
        assert_eq!(serde_json::to_string(&CommitSource::Slack).unwrap(), "\"slack\"");
    }
}
