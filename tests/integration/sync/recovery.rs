//! Interrupted passes, fresh mirrors and refused publishes.

use std::fs;
use std::path::Path;

use remap_sync::git::{SyncError, Syncer};
use remap_sync::rewrite::{InProcessRemapper, RemapReport, RewriteError, TreeRemapper};

use crate::fixtures::git::read_file;
use crate::fixtures::rig::{DATA_TXT, SyncRig, TABLE, USE_JAVA, engine, use_remapped, use_source};

#[test]
fn stale_working_branch_is_reset_to_last_aligned_pair() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);
    let start = syncer.init().expect("init");

    // Leftovers of a pass that died after moving the branch.
    let topology = mirror.topology().clone();
    mirror.set_branch(&topology.temp_derived, start.tracking).unwrap();
    fs::write(mirror.workdir().join("half-written.tmp"), "junk").unwrap();

    let u1 = rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "Bump data");
    let summary = syncer.sync(None).expect("sync");
    let integration = &summary.integrated[0];
    assert_eq!(integration.upstream, u1);

    let repo = mirror.repo();
    let derived = repo.find_commit(integration.derived).unwrap();
    assert_eq!(derived.parent_ids().collect::<Vec<_>>(), [start.derived]);
    assert_eq!(read_file(repo, derived.id(), USE_JAVA), Some(use_remapped("")));
    assert!(!mirror.workdir().join("half-written.tmp").exists());
}

#[test]
fn fresh_mirror_adopts_published_branches() {
    let rig = SyncRig::new();
    let first = rig.mirror();
    rig.syncer(&first).init().expect("init");
    rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "Bump data");
    let synced = rig.syncer(&first).sync(None).expect("sync");
    let published = synced.integrated[0].derived;

    let second = rig.mirror_at(&rig.mirror_dir("replacement"));
    let pair = rig.syncer(&second).init().expect("adopt");
    assert_eq!(pair.derived, published);
    assert_eq!(Some(pair.tracking), rig.published("upstream/main"));

    let u2 = rig.commit_upstream(
        &[(USE_JAVA, Some(use_source(" int n;").as_str()))],
        "Carol",
        "Count uses",
    );
    let summary = rig.syncer(&second).sync(None).expect("sync from new mirror");
    let integration = &summary.integrated[0];
    assert_eq!(integration.upstream, u2);
    let repo = second.repo();
    let derived = repo.find_commit(integration.derived).unwrap();
    assert_eq!(derived.parent_ids().collect::<Vec<_>>(), [published]);
    assert_eq!(read_file(repo, derived.id(), USE_JAVA), Some(use_remapped(" int n;")));
    assert_eq!(rig.published("remapped/main"), Some(derived.id()));
}

#[test]
fn refused_publish_is_completed_by_next_pass() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);
    let start = syncer.init().expect("init");

    rig.root.set_head("refs/heads/remapped/main").unwrap();
    rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "Bump data");
    let err = syncer.sync(None).expect_err("checked out branch must not move");
    assert!(matches!(err, SyncError::BranchCheckedOut(ref b) if b == "remapped/main"), "{err:?}");
    assert_eq!(rig.published("remapped/main"), Some(start.derived));

    // The integration itself was recorded.
    let last = mirror.alignment_log().unwrap().last().unwrap();
    assert_ne!(last.derived, start.derived);

    rig.root.set_head("refs/heads/trunk").unwrap();
    let summary = syncer.sync(None).expect("sync");
    assert!(summary.integrated.is_empty());
    assert!(summary.up_to_date);
    assert_eq!(rig.published("remapped/main"), Some(last.derived));
}

const DROPPED: &str = "core/src/main/resources/dropped.txt";

/// Remaps like the built-in engine but leaves [`DROPPED`] out of the
/// derived tree.
struct Dropping(InProcessRemapper);

impl TreeRemapper for Dropping {
    fn remap_tree(&self, input: &Path, output: &Path) -> Result<RemapReport, RewriteError> {
        let report = self.0.remap_tree(input, output)?;
        let dropped = output.join(DROPPED);
        if dropped.exists() {
            fs::remove_file(dropped).expect("drop file");
        }
        Ok(report)
    }
}

#[test]
fn unresolvable_conflict_rolls_back_the_pass() {
    let rig = SyncRig::with_seed(&[(DROPPED, Some("one\n"))]);
    let mirror = rig.mirror();
    let remapper = Dropping(engine(TABLE));
    let syncer = Syncer::new(&mirror, &remapper, Default::default(), "mojang");
    let start = syncer.init().expect("init");
    assert_eq!(read_file(mirror.repo(), start.derived, DROPPED), None);

    let incoming = rig.commit_upstream(&[(DROPPED, Some("two\n"))], "Bob", "Edit dropped file");
    let err = syncer.sync(None).expect_err("modify/delete must not resolve");
    match err {
        SyncError::ConflictFatal { commit, paths } => {
            assert_eq!(commit, incoming.to_string());
            assert_eq!(paths, [DROPPED]);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let topology = mirror.topology();
    assert_eq!(mirror.branch_tip(&topology.temp_derived).unwrap(), Some(start.derived));
    assert_eq!(mirror.branch_tip(&topology.temp_tracking).unwrap(), Some(start.tracking));
    assert_eq!(mirror.repo().state(), git2::RepositoryState::Clean);
    let log = mirror.alignment_log().unwrap();
    assert_eq!(log.len(), 1);
    assert_eq!(log.last(), Some(start));
    assert_eq!(rig.published("upstream/main"), Some(start.tracking));
    assert_eq!(rig.published("remapped/main"), Some(start.derived));

    // The same commit fails again instead of being skipped.
    let again = syncer.sync(None).expect_err("still unresolvable");
    assert!(matches!(again, SyncError::ConflictFatal { .. }), "{again:?}");
    assert_eq!(mirror.alignment_log().unwrap().len(), 1);
}
