//! Registry schema and validation rules.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::core::{ChannelId, ProjectId, UserId};

use super::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    pub channel_name: String,
    pub channel_id: ChannelId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectEntry {
    pub project_id: ProjectId,
    pub name: String,
    pub owner_user_ids: Vec<UserId>,
}

/// The static project registry: the single source channel plus the set of
/// valid projects and their owner sets. Projects are configured here, never
/// created by the commit pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    pub slack: ChannelConfig,
    pub projects: Vec<ProjectEntry>,
}

impl RegistryConfig {
    /// Validation rules:
    /// - channel name and id non-blank
    /// - at least two projects
    /// - project ids unique, ids and names non-blank
    /// - owner lists non-empty with no blank entries
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slack.channel_name.trim().is_empty() {
            return Err(invalid("slack.channel_name must not be empty"));
        }
        if self.slack.channel_id.as_str().trim().is_empty() {
            return Err(invalid("slack.channel_id must not be empty"));
        }
        if self.projects.len() < 2 {
            return Err(invalid("at least two projects must be configured"));
        }

        let mut seen = BTreeSet::new();
        for project in &self.projects {
            let id = project.project_id.as_str();
            if id.trim().is_empty() {
                return Err(invalid("projects.project_id must not be empty"));
            }
            if project.name.trim().is_empty() {
                return Err(invalid("projects.name must not be empty"));
            }
            if !seen.insert(id.to_string()) {
                return Err(ConfigError::InvalidRegistry {
                    reason: format!("projects.project_id values must be unique (duplicate `{id}`)"),
                });
            }
            if project.owner_user_ids.is_empty() {
                return Err(ConfigError::InvalidRegistry {
                    reason: format!("project `{id}` must have at least one owner"),
                });
            }
            if project
                .owner_user_ids
                .iter()
                .any(|owner| owner.as_str().trim().is_empty())
            {
                return Err(ConfigError::InvalidRegistry {
                    reason: format!("project `{id}` owner_user_ids must not contain empty values"),
                });
            }
        }
        Ok(())
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.slack.channel_id
    }

    pub fn contains(&self, project_id: &ProjectId) -> bool {
        self.projects
            .iter()
            .any(|project| &project.project_id == project_id)
    }

    /// All configured project ids, sorted. Surfaced back to users on
    /// unknown-project rejections.
    pub fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<ProjectId> = self
            .projects
            .iter()
            .map(|project| project.project_id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Owner sets keyed by project id.
    pub fn owner_sets(&self) -> BTreeMap<ProjectId, BTreeSet<UserId>> {
        self.projects
            .iter()
            .map(|project| {
                (
                    project.project_id.clone(),
                    project.owner_user_ids.iter().cloned().collect(),
                )
            })
            .collect()
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::InvalidRegistry {
        reason: reason.to_string(),
    }
}
