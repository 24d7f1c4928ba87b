//! Error taxonomy for a collection cycle.
//!
//! Only conditions that abort a cycle (or that stop configuration from
//! resolving) are represented here. Malformed counter fields and requested
//! metrics that cannot be resolved are tolerated where they occur.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by policy resolution and collection.
#[derive(Error, Debug)]
pub enum CollectError {
    /// A pseudo-file is missing or unreadable.
    #[error("error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The active core count has no usable first token.
    #[error("invalid core count in {}: {reason}", path.display())]
    CoreCount { path: PathBuf, reason: String },

    /// A policy rule has neither a supplied value nor a default.
    #[error("missing required config item `{key}`")]
    MissingConfig { key: String },

    /// A supplied config value (or config file) cannot be used.
    #[error("invalid config item `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A requested metric namespace cannot be parsed.
    #[error("invalid namespace `{namespace}`: {reason}")]
    InvalidNamespace { namespace: String, reason: String },
}

impl CollectError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CollectError>;
