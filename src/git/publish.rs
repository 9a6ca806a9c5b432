//! Publishing mirror branches into the root repository.
//!
//! The root repository pulls the mirror's branch into a scratch ref and the
//! published branch is then fast-forwarded to it. A branch that would move
//! backwards or sideways is refused, as is a branch checked out in the root
//! work tree.

use git2::{Oid, Repository};

use super::error::SyncError;
use super::mirror::{Mirror, fetch_options};
use super::topology::BranchTopology;

const INCOMING_PREFIX: &str = "refs/remap-sync/incoming/";

/// Publishes mirror branch `src` as root branch `dst`. Returns the new tip.
pub fn publish(mirror: &Mirror, src: &str, dst: &str) -> Result<Oid, SyncError> {
    let tip = mirror.require_tip(src)?;
    let root = Repository::open(mirror.root())
        .map_err(|e| SyncError::OpenRepo(mirror.root().to_path_buf(), e))?;
    let target = BranchTopology::local_ref(dst);

    let previous = match root.refname_to_id(&target) {
        Ok(oid) => Some(oid),
        Err(e) if e.code() == git2::ErrorCode::NotFound => None,
        Err(e) => return Err(e.into()),
    };
    if previous == Some(tip) {
        tracing::debug!(branch = dst, "already published");
        record_remote_tip(mirror, dst, tip)?;
        return Ok(tip);
    }
    if let Ok(head) = root.head()
        && head.name() == Some(target.as_str())
    {
        return Err(SyncError::BranchCheckedOut(dst.to_string()));
    }

    let incoming = format!("{INCOMING_PREFIX}{dst}");
    let url = mirror.workdir().to_string_lossy().into_owned();
    let refspec = format!("+{}:{incoming}", BranchTopology::local_ref(src));
    let mut remote = root.remote_anonymous(&url)?;
    remote
        .fetch(&[refspec.as_str()], Some(&mut fetch_options(&root)), None)
        .map_err(|source| SyncError::Fetch {
            remote: url.clone(),
            source,
        })?;

    let outcome = advance(&root, &target, previous, tip, dst);
    if let Ok(mut scratch) = root.find_reference(&incoming) {
        scratch.delete()?;
    }
    outcome?;

    record_remote_tip(mirror, dst, tip)?;
    tracing::info!(branch = dst, tip = %tip, "published");
    Ok(tip)
}

/// Publishes both working branches of the mirror.
pub fn publish_all(mirror: &Mirror) -> Result<(), SyncError> {
    let topology = mirror.topology().clone();
    for (src, dst) in topology.published() {
        publish(mirror, src, dst)?;
    }
    Ok(())
}

fn advance(
    root: &Repository,
    target: &str,
    previous: Option<Oid>,
    tip: Oid,
    branch: &str,
) -> Result<(), SyncError> {
    if let Some(previous) = previous
        && !root.graph_descendant_of(tip, previous)?
    {
        return Err(SyncError::NonFastForward {
            branch: branch.to_string(),
        });
    }
    root.reference(target, tip, true, "remap-sync: publish")?;
    Ok(())
}

/// Keeps the mirror's view of the root branch current without a fetch.
fn record_remote_tip(mirror: &Mirror, branch: &str, tip: Oid) -> Result<(), SyncError> {
    let name = mirror.topology().root_ref(branch);
    mirror
        .repo()
        .reference(&name, tip, true, "remap-sync: published")?;
    Ok(())
}
