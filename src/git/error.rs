//! Git sync error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};
use crate::rewrite::RewriteError;

/// Errors that can occur during a sync pass.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SyncError {
    #[error("failed to open repository at {0}: {1}")]
    OpenRepo(PathBuf, #[source] git2::Error),

    #[error("failed to initialize mirror at {0}: {1}")]
    InitMirror(PathBuf, #[source] git2::Error),

    #[error("failed to fetch from {remote}: {source}")]
    Fetch {
        remote: String,
        #[source]
        source: git2::Error,
    },

    #[error("local ref not found: {0}")]
    NoLocalRef(String),

    #[error("remote ref not found: {0}")]
    NoRemoteRef(String),

    #[error("mirror at {0} is not initialized")]
    Uninitialized(PathBuf),

    #[error("repository at {0} has no work tree")]
    Bare(PathBuf),

    #[error("failed to check out {target}: {source}")]
    Checkout {
        target: String,
        #[source]
        source: git2::Error,
    },

    #[error("failed to cherry-pick {commit}: {source}")]
    CherryPick {
        commit: String,
        #[source]
        source: git2::Error,
    },

    #[error("unresolvable conflicts cherry-picking {commit}: {}", paths.join(", "))]
    ConflictFatal { commit: String, paths: Vec<String> },

    #[error("failed to create commit: {0}")]
    Commit(#[source] git2::Error),

    #[error("update of {branch} rejected (non-fast-forward)")]
    NonFastForward { branch: String },

    #[error("branch {0} is checked out in the root repository")]
    BranchCheckedOut(String),

    #[error("failed to {action} alignment log {path}: {source}")]
    AlignmentIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed alignment log {path}: {source}")]
    AlignmentFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Remap(#[from] RewriteError),

    #[error("git operation failed: {0}")]
    Git(#[from] git2::Error),
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether retrying this pass may succeed.
    pub fn transience(&self) -> Transience {
        match self {
            SyncError::Fetch { .. } | SyncError::NonFastForward { .. } => Transience::Retryable,

            SyncError::Io { .. } | SyncError::AlignmentIo { .. } => Transience::Unknown,

            SyncError::Remap(e) => e.transience(),

            SyncError::OpenRepo(_, _)
            | SyncError::InitMirror(_, _)
            | SyncError::NoLocalRef(_)
            | SyncError::NoRemoteRef(_)
            | SyncError::Uninitialized(_)
            | SyncError::Bare(_)
            | SyncError::Checkout { .. }
            | SyncError::CherryPick { .. }
            | SyncError::ConflictFatal { .. }
            | SyncError::Commit(_)
            | SyncError::BranchCheckedOut(_)
            | SyncError::AlignmentFormat { .. }
            | SyncError::Git(_) => Transience::Permanent,
        }
    }

    /// What we know about side effects when this error is returned.
    pub fn effect(&self) -> Effect {
        match self {
            // Publishing happens after the mirror commit and alignment record.
            SyncError::NonFastForward { .. } | SyncError::BranchCheckedOut(_) => Effect::Some,

            // The derived branch is rolled back before this is returned.
            SyncError::ConflictFatal { .. } => Effect::None,

            // Low-level failures can happen at any phase.
            SyncError::Git(_)
            | SyncError::Io { .. }
            | SyncError::AlignmentIo { .. }
            | SyncError::Commit(_) => Effect::Unknown,

            SyncError::Remap(e) => e.effect(),

            _ => Effect::None,
        }
    }
}
