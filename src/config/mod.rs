//! Runtime configuration.
//!
//! Two sources, both validated at startup:
//! - `Settings`: process environment (tokens, secrets, bind address)
//! - `RegistryConfig`: the static project registry JSON (source channel,
//!   valid project ids, owner sets)

mod load;
mod schema;

pub use load::{load_registry, Settings};
pub use schema::{ChannelConfig, ProjectEntry, RegistryConfig};

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },

    #[error("missing required project registry file: {path}")]
    MissingRegistry { path: String },

    #[error("invalid JSON in {path}: {reason}")]
    InvalidJson { path: String, reason: String },

    #[error("invalid project registry: {reason}")]
    InvalidRegistry { reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
