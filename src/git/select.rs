//! Next-commit selection and classification.

use git2::{Oid, Repository, Sort};

use super::error::SyncError;

/// How an upstream commit is integrated into the derived branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitKind {
    /// A symbol-sensitive file changed; the whole tree is re-remapped.
    Remap,
    /// Only inert files changed; a cherry-pick suffices.
    PlainPick,
}

impl std::fmt::Display for CommitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitKind::Remap => f.write_str("remap"),
            CommitKind::PlainPick => f.write_str("plain pick"),
        }
    }
}

/// The commit that directly follows `current` on the way to `head`.
///
/// Walks the ancestors of `head` that are not ancestors of `current`, oldest
/// first, and returns the first one with `current` among its parents. `None`
/// when `current` is already `head` or nothing descends from it directly.
pub fn next_commit(repo: &Repository, current: Oid, head: Oid) -> Result<Option<Oid>, SyncError> {
    if current == head {
        return Ok(None);
    }
    let mut walk = repo.revwalk()?;
    walk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
    walk.push(head)?;
    walk.hide(current)?;
    for oid in walk {
        let oid = oid?;
        let commit = repo.find_commit(oid)?;
        if commit.parent_ids().any(|parent| parent == current) {
            return Ok(Some(oid));
        }
    }
    Ok(None)
}

/// Number of commits reachable from `head` but not from `current`.
pub fn commits_behind(repo: &Repository, current: Oid, head: Oid) -> Result<usize, SyncError> {
    let (ahead, _) = repo.graph_ahead_behind(head, current)?;
    Ok(ahead)
}

/// Classifies the step from `current` to `next` by the paths it touches.
pub fn classify(
    repo: &Repository,
    current: Oid,
    next: Oid,
    suffixes: &[String],
) -> Result<CommitKind, SyncError> {
    let old = repo.find_commit(current)?.tree()?;
    let new = repo.find_commit(next)?.tree()?;
    let diff = repo.diff_tree_to_tree(Some(&old), Some(&new), None)?;
    for delta in diff.deltas() {
        let paths = [delta.old_file().path(), delta.new_file().path()];
        for path in paths.into_iter().flatten() {
            let path = path.to_string_lossy();
            if let Some(suffix) = suffixes.iter().find(|s| path.ends_with(s.as_str())) {
                tracing::debug!(%path, %suffix, "symbol-sensitive change");
                return Ok(CommitKind::Remap);
            }
        }
    }
    Ok(CommitKind::PlainPick)
}
