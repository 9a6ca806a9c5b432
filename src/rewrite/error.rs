use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::access::DescriptorError;
use crate::error::{Effect, Transience};
use crate::external::ExternalProcessFailure;
use crate::mapping::MappingError;

/// Errors from the source rewriter. Inside a project run, per-file failures
/// become [`RemapWarning`]s; these errors fail one project or the whole run.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RewriteError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot remap {0} in place")]
    InPlace(PathBuf),

    #[error("failed to unpack archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    #[error("unsupported source root {0}")]
    UnsupportedRoot(PathBuf),

    #[error("malformed metadata file {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unterminated {what} starting at line {line}")]
    Lex { what: &'static str, line: usize },

    #[error("remap worker for {0} panicked")]
    WorkerPanicked(String),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    External(#[from] ExternalProcessFailure),
}

impl RewriteError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RewriteError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn transience(&self) -> Transience {
        match self {
            RewriteError::Io { .. } | RewriteError::Archive { .. } => Transience::Unknown,
            RewriteError::Mapping(e) => e.transience(),
            RewriteError::Descriptor(e) => e.transience(),
            RewriteError::External(e) => e.transience(),
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            // Output trees may be partially written.
            RewriteError::Io { .. } | RewriteError::WorkerPanicked(_) => Effect::Unknown,
            RewriteError::Mapping(e) => e.effect(),
            RewriteError::Descriptor(e) => e.effect(),
            RewriteError::External(e) => e.effect(),
            _ => Effect::None,
        }
    }
}

/// A single unit that could not be rewritten. Its output is the input copied
/// unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemapWarning {
    pub path: PathBuf,
    pub reason: String,
}

impl fmt::Display for RemapWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.reason)
    }
}
