//! Environment settings and registry file loading.

use std::fs;
use std::path::Path;

use super::schema::RegistryConfig;
use super::ConfigError;

/// Process-environment settings. All secrets stay here, never in the
/// registry file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub environment: String,
    pub bind_addr: String,
    pub slack_bot_token: String,
    pub slack_signing_secret: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_name: env_or("APP_NAME", "dendrite"),
            environment: env_or("ENVIRONMENT", "development"),
            bind_addr: env_or("BIND_ADDR", "127.0.0.1:8080"),
            slack_bot_token: required_env("SLACK_BOT_TOKEN")?,
            slack_signing_secret: required_env("SLACK_SIGNING_SECRET")?,
        })
    }
}

fn env_or(name: &str, default: &str) -> String {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => default.to_string(),
    }
}

fn required_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingEnv { name }),
    }
}

/// Load and validate the project registry from a JSON file.
pub fn load_registry(path: &Path) -> Result<RegistryConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingRegistry {
            path: path.display().to_string(),
        });
    }
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let registry: RegistryConfig =
        serde_json::from_str(&contents).map_err(|err| ConfigError::InvalidJson {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
    registry.validate()?;
    Ok(registry)
}
