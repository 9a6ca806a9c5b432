//! Git integration module.
//!
//! Provides:
//! - Mirror of the upstream repository with `upstream` and `root` remotes
//! - Next-commit selection and remap/plain-pick classification
//! - Sync typestate machine (Idle → Aligned → Pending → Picked → Committed)
//! - Alignment log pairing tracking and derived commits
//! - Fast-forward publishing into the root repository

pub mod alignment;
pub mod conflict;
pub mod error;
pub mod mirror;
pub mod publish;
pub mod select;
pub mod sync;
pub mod topology;

pub use alignment::{AlignedPair, AlignmentLog};
pub use conflict::{Resolution, resolve_conflicts, rollback};
pub use error::SyncError;
pub use mirror::Mirror;
pub use publish::{publish, publish_all};
pub use select::{CommitKind, classify, commits_behind, next_commit};
pub use sync::{
    Integration, StatusReport, SyncOutcome, SyncProcess, SyncSettings, SyncState, SyncSummary,
    Syncer,
};
pub use topology::{BranchNames, BranchTopology};
