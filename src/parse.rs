//! Structured-text parsing.
//!
//! Two grammars, chosen by a containment check:
//! - constraint: `project: <id> constraint: <key>=<value> [type: <DesignChoice|Requirement>] why: <reason>`
//! - dependency: `project: <id> depends_on: <other_id> why: <reason>`
//!
//! Keywords are case-insensitive. A message only reaches `parse_diff` if it
//! first passes `is_structured_attempt`; everything else is a plain message
//! (summary + hashtag entities) and never attempts a mutation.

use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::core::{ConstraintType, ConstraintUpsert, DependencyAdd, ProjectId, ProposedDiff};

pub const CONSTRAINT_TEMPLATE: &str =
    "project: <id> constraint: <key>=<value> [type: DesignChoice|Requirement] why: <reason>";
pub const DEPENDENCY_TEMPLATE: &str = "project: <id> depends_on: <other_id> why: <reason>";

const SUMMARY_MAX_CHARS: usize = 120;

/// Grammar mismatch. Carries the template the text was expected to match.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("constraint update must match `{template}`")]
    Constraint { template: &'static str },
    #[error("dependency update must match `{template}`")]
    Dependency { template: &'static str },
}

impl ParseError {
    fn constraint() -> Self {
        Self::Constraint {
            template: CONSTRAINT_TEMPLATE,
        }
    }

    fn dependency() -> Self {
        Self::Dependency {
            template: DEPENDENCY_TEMPLATE,
        }
    }

    pub fn template(&self) -> &'static str {
        match self {
            Self::Constraint { template } | Self::Dependency { template } => template,
        }
    }
}

/// Non-mutating message: short summary plus `#hashtag` entities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlainMessage {
    pub summary: String,
    pub entities: Vec<String>,
}

/// Does this text look like it intends a graph mutation?
///
/// Texts failing this check are plain messages and never reach the
/// grammars, however malformed they may be.
pub fn is_structured_attempt(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("project:") && (lower.contains("constraint:") || lower.contains("depends_on:"))
}

/// Parse a structured attempt into a typed diff.
///
/// Grammar choice: `depends_on:` anywhere in the lowercase text selects the
/// dependency grammar, otherwise the constraint grammar. Either the whole
/// diff parses or a `ParseError` names the expected template.
pub fn parse_diff(text: &str) -> Result<ProposedDiff, ParseError> {
    if text.to_lowercase().contains("depends_on:") {
        parse_dependency(text)
    } else {
        parse_constraint(text)
    }
}

/// Parse a non-mutating message: first 120 chars as summary, whitespace
/// tokens starting with `#` as entities.
pub fn parse_plain(text: &str) -> PlainMessage {
    let summary: String = text.chars().take(SUMMARY_MAX_CHARS).collect();
    let entities = text
        .split_whitespace()
        .filter(|token| token.starts_with('#'))
        .map(str::to_string)
        .collect();
    PlainMessage {
        summary: summary.trim().to_string(),
        entities,
    }
}

fn constraint_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?is)^\s*project:\s*(\S+)\s+constraint:\s*([^=]+?)\s*=\s*(.+?)\s*(?:type:\s*(\S+)\s+)?why:\s*(.*?)\s*$",
        )
        .expect("constraint grammar regex")
    })
}

fn dependency_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?is)^\s*project:\s*(\S+)\s+depends_on:\s*(\S+)\s+why:\s*(.*?)\s*$")
            .expect("dependency grammar regex")
    })
}

fn parse_constraint(text: &str) -> Result<ProposedDiff, ParseError> {
    let captures = constraint_re()
        .captures(text)
        .ok_or_else(ParseError::constraint)?;

    let project_id = ProjectId::new(&captures[1]).map_err(|_| ParseError::constraint())?;
    let key = captures[2].trim().to_string();
    let value = captures[3].trim().to_string();
    if key.is_empty() || value.is_empty() {
        return Err(ParseError::constraint());
    }

    let constraint_type = match captures.get(4) {
        Some(raw) => parse_type(raw.as_str()).ok_or_else(ParseError::constraint)?,
        None => ConstraintType::default(),
    };

    let reason = captures[5].trim().to_string();
    if reason.is_empty() {
        return Err(ParseError::constraint());
    }

    Ok(ProposedDiff::ConstraintUpsert(ConstraintUpsert {
        project_id,
        key,
        value,
        constraint_type,
        reason,
    }))
}

fn parse_dependency(text: &str) -> Result<ProposedDiff, ParseError> {
    let captures = dependency_re()
        .captures(text)
        .ok_or_else(ParseError::dependency)?;

    let from_project_id = ProjectId::new(&captures[1]).map_err(|_| ParseError::dependency())?;
    let to_project_id = ProjectId::new(&captures[2]).map_err(|_| ParseError::dependency())?;

    let reason = captures[3].trim().to_string();
    if reason.is_empty() {
        return Err(ParseError::dependency());
    }

    Ok(ProposedDiff::DependencyAdd(DependencyAdd {
        from_project_id,
        to_project_id,
        reason,
    }))
}

fn parse_type(raw: &str) -> Option<ConstraintType> {
    let lower = raw.to_lowercase();
    match lower.as_str() {
        "designchoice" | "design_choice" => Some(ConstraintType::DesignChoice),
        "requirement" => Some(ConstraintType::Requirement),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraint(text: &str) -> ConstraintUpsert {
        match parse_diff(text).unwrap() {
            ProposedDiff::ConstraintUpsert(u) => u,
            other => panic!("expected constraint upsert, got {other:?}"),
        }
    }

    fn dependency(text: &str) -> DependencyAdd {
        match parse_diff(text).unwrap() {
            ProposedDiff::DependencyAdd(d) => d,
            other => panic!("expected dependency add, got {other:?}"),
        }
    }

    #[test]
    fn structured_attempt_requires_both_markers() {
        assert!(is_structured_attempt("project: api constraint: k=v why: x"));
        assert!(is_structured_attempt("PROJECT: api DEPENDS_ON: web why: x"));
        assert!(!is_structured_attempt("project: api is going well"));
        assert!(!is_structured_attempt("constraint: k=v why: x"));
        assert!(!is_structured_attempt("shipping the release #launch"));
    }

    #[test]
    fn constraint_round_trip() {
        let parsed = constraint(
            "project: api constraint: storage=postgres type: Requirement why: durability matters",
        );
        assert_eq!(parsed.project_id.as_str(), "api");
        assert_eq!(parsed.key, "storage");
        assert_eq!(parsed.value, "postgres");
        assert_eq!(parsed.constraint_type, ConstraintType::Requirement);
        assert_eq!(parsed.reason, "durability matters");
    }

    #[test]
    fn keywords_are_case_insensitive() {
        let parsed = constraint("Project: api CONSTRAINT: storage=postgres Type: requirement WHY: durability");
        assert_eq!(parsed.key, "storage");
        assert_eq!(parsed.constraint_type, ConstraintType::Requirement);

        let parsed = dependency("PROJECT: web Depends_On: api WHY: calls it");
        assert_eq!(parsed.from_project_id.as_str(), "web");
        assert_eq!(parsed.to_project_id.as_str(), "api");
    }

    #[test]
    fn type_defaults_to_design_choice() {
        let parsed = constraint("project: api constraint: storage=postgres why: team decision");
        assert_eq!(parsed.constraint_type, ConstraintType::DesignChoice);
    }

    #[test]
    fn value_may_contain_spaces() {
        let parsed =
            constraint("project: api constraint: cache policy=write through why: read heavy");
        assert_eq!(parsed.key, "cache policy");
        assert_eq!(parsed.value, "write through");
    }

    #[test]
    fn empty_reason_is_rejected() {
        let err = parse_diff("project: api constraint: k=v why:   ").unwrap_err();
        assert_eq!(err.template(), CONSTRAINT_TEMPLATE);

        let err = parse_diff("project: web depends_on: api why: ").unwrap_err();
        assert_eq!(err.template(), DEPENDENCY_TEMPLATE);
    }

    #[test]
    fn missing_fields_are_rejected_with_template() {
        let err = parse_diff("project: api constraint: storage why: x").unwrap_err();
        assert!(matches!(err, ParseError::Constraint { .. }));

        let err = parse_diff("project: web depends_on: why: x").unwrap_err();
        assert!(matches!(err, ParseError::Dependency { .. }));
    }

    #[test]
    fn unknown_type_token_is_rejected() {
        let err =
            parse_diff("project: api constraint: k=v type: Wish why: please").unwrap_err();
        assert!(matches!(err, ParseError::Constraint { .. }));
    }

    #[test]
    fn depends_on_selects_dependency_grammar() {
        // Even with `constraint:` present, depends_on wins grammar selection.
        let err = parse_diff("project: api constraint: k=v depends_on: web why: x");
        assert!(matches!(err, Err(ParseError::Dependency { .. })));
    }

    #[test]
    fn plain_summary_and_entities() {
        let plain = parse_plain("shipping the release #launch soon #infra");
        assert_eq!(plain.summary, "shipping the release #launch soon #infra");
        assert_eq!(plain.entities, vec!["#launch", "#infra"]);

        let long = "x".repeat(200);
        assert_eq!(parse_plain(&long).summary.chars().count(), 120);
    }
}
