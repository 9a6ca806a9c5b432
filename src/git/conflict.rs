//! Cherry-pick conflict resolution.
//!
//! Only deletion conflicts are resolved automatically: the incoming commit
//! removed a file the derived branch still has. Every other conflict rolls
//! the derived branch back and fails the pass.

use std::fs;
use std::path::Path;

use git2::{CherrypickOptions, Commit, FileFavor, MergeOptions, Oid, Repository};

use super::error::SyncError;
use super::mirror::reset_hard;

/// Paths removed while resolving conflicts.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Files the incoming commit deleted.
    pub deleted: Vec<String>,
}

impl Resolution {
    pub fn is_empty(&self) -> bool {
        self.deleted.is_empty()
    }
}

/// Resolves the conflicts of an in-progress cherry-pick of `commit`.
///
/// On an unresolvable conflict the work tree is hard-reset to `tip` and
/// [`SyncError::ConflictFatal`] is returned.
pub fn resolve_conflicts(
    repo: &Repository,
    commit: Oid,
    tip: Oid,
) -> Result<Resolution, SyncError> {
    let mut index = repo.index()?;
    if !index.has_conflicts() {
        return Ok(Resolution::default());
    }

    let mut resolution = Resolution::default();
    let mut fatal = Vec::new();
    let conflicts = index.conflicts()?.collect::<Result<Vec<_>, _>>()?;
    for conflict in conflicts {
        let Some(entry) = conflict
            .their
            .as_ref()
            .or(conflict.our.as_ref())
            .or(conflict.ancestor.as_ref())
        else {
            continue;
        };
        let path = String::from_utf8_lossy(&entry.path).into_owned();
        if conflict.their.is_none() {
            tracing::warn!(commit = %commit, %path, "dropping file deleted upstream");
            resolution.deleted.push(path);
        } else {
            fatal.push(path);
        }
    }

    if !fatal.is_empty() {
        fatal.sort();
        fatal.dedup();
        tracing::warn!(commit = %commit, paths = ?fatal, "unresolvable conflicts, rolling back");
        rollback(repo, tip)?;
        return Err(SyncError::ConflictFatal {
            commit: commit.to_string(),
            paths: fatal,
        });
    }

    let workdir = repo
        .workdir()
        .ok_or_else(|| SyncError::Bare(repo.path().to_path_buf()))?;
    for path in &resolution.deleted {
        index.remove_path(Path::new(path))?;
        let file = workdir.join(path);
        match fs::remove_file(&file) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(SyncError::io(file, e)),
        }
    }
    index.write()?;
    Ok(resolution)
}

/// Cherry-pick options for replaying `upstream`: content conflicts take the
/// incoming side, and a merge commit is picked against the parent equal to
/// `tracking`.
pub fn pick_options(upstream: &Commit<'_>, tracking: Oid) -> CherrypickOptions<'static> {
    let mut merge = MergeOptions::new();
    merge.file_favor(FileFavor::Theirs);
    let mut options = CherrypickOptions::new();
    options.merge_opts(merge);
    if upstream.parent_count() > 1 {
        let mainline = upstream
            .parent_ids()
            .position(|parent| parent == tracking)
            .unwrap_or(0);
        options.mainline(mainline as u32 + 1);
    }
    options
}

/// Discards the in-progress pick and restores `tip`.
pub fn rollback(repo: &Repository, tip: Oid) -> Result<(), SyncError> {
    reset_hard(repo, tip)
}
