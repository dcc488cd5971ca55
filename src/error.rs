//! Crate-level convenience error.
//!
//! Not a god error: a thin wrapper over the canonical component errors.
//! Pipeline terminal states (ignored, duplicate, no-op, parse failure,
//! unknown project) are values in the outcome type, never `Err`s.

use thiserror::Error;

use crate::commit::CommitError;
use crate::config::ConfigError;
use crate::core::CoreError;
use crate::parse::ParseError;
use crate::slack::{PermalinkError, SignatureError};
use crate::store::StoreError;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Commit(#[from] CommitError),

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Permalink(#[from] PermalinkError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
