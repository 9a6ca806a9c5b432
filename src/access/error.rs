use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

/// Errors raised while reading, remapping or writing an access descriptor.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum DescriptorError {
    #[error("failed to read access descriptor {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write access descriptor {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("access descriptor has no header")]
    MissingHeader,

    #[error("unsupported access descriptor version {0}")]
    UnsupportedVersion(u32),

    #[error("malformed access descriptor at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("cannot remap access descriptor from namespace {found}, expected {expected}")]
    NamespaceMismatch { expected: String, found: String },

    #[error("no access descriptors to merge")]
    NothingToMerge,
}

impl DescriptorError {
    pub fn transience(&self) -> Transience {
        match self {
            DescriptorError::Read { .. } | DescriptorError::Write { .. } => Transience::Unknown,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            DescriptorError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
