//! Mapping composer error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Errors raised while loading, transforming or composing mapping tables.
///
/// All of these are fatal for a synchronization pass: no partial mapping is
/// usable.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MappingError {
    #[error("failed to read mappings from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write mappings to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed mappings at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("unrecognized mapping format (first line: {0:?})")]
    UnknownFormat(String),

    #[error("archive {path} does not contain {entry}")]
    MissingArchiveEntry { path: PathBuf, entry: String },

    #[error("invalid namespace label {0:?}")]
    InvalidNamespace(String),

    #[error("namespace {0} is not present in the table")]
    UnknownNamespace(String),

    #[error("namespace {0} appears more than once")]
    DuplicateNamespace(String),

    #[error("tables are keyed from different origins: {left} vs {right}")]
    OriginMismatch { left: String, right: String },

    #[error("source namespace {0} must be retained")]
    SourceNotRetained(String),

    #[error("table has no destination namespace")]
    NoDestination,
}

impl MappingError {
    pub fn transience(&self) -> Transience {
        match self {
            MappingError::Read { .. } | MappingError::Write { .. } => Transience::Unknown,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // A failed write may have truncated the output file.
            MappingError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
