//! Remap runs that fail for part of the tree.

use std::fs;
use std::path::Path;

use remap_sync::git::Syncer;
use remap_sync::rewrite::{InProcessRemapper, RemapReport, RewriteError, TreeRemapper};

use crate::fixtures::git::read_file;
use crate::fixtures::rig::{DATA_TXT, SyncRig, TABLE, USE_JAVA, engine, use_remapped, use_source};

const CLIENT_METADATA: &str = "core/src/client/resources/fabric.mod.json";
const CLIENT_DESCRIPTOR: &str = "core/src/client/resources/core.accesswidener";
const FOREIGN_DESCRIPTOR: &str = "accessWidener v2 intermediary\naccessible class net/a/Old\n";

#[test]
fn unmappable_descriptor_keeps_the_rest_of_the_project() {
    let rig = SyncRig::with_seed(&[
        (CLIENT_METADATA, Some(r#"{"accessWidener": "core.accesswidener"}"#)),
        (CLIENT_DESCRIPTOR, Some(FOREIGN_DESCRIPTOR)),
    ]);
    let mirror = rig.mirror();
    let pair = rig.syncer(&mirror).init().expect("init");

    let repo = mirror.repo();
    assert_eq!(read_file(repo, pair.derived, USE_JAVA), Some(use_remapped("")));
    assert_eq!(read_file(repo, pair.derived, DATA_TXT).as_deref(), Some("v1\n"));
    assert_eq!(
        read_file(repo, pair.derived, CLIENT_DESCRIPTOR).as_deref(),
        Some(FOREIGN_DESCRIPTOR)
    );
    assert_eq!(rig.published("remapped/main"), Some(pair.derived));
}

/// Remaps like the built-in engine, then reports `core` as failed after
/// dropping part of its output.
struct HalfDone(InProcessRemapper);

impl TreeRemapper for HalfDone {
    fn remap_tree(&self, input: &Path, output: &Path) -> Result<RemapReport, RewriteError> {
        let mut report = self.0.remap_tree(input, output)?;
        fs::remove_dir_all(output.join("core/src/main/resources")).expect("trim output");
        for project in &mut report.projects {
            if project.name == "core" {
                project.outcome = Err(RewriteError::WorkerPanicked("core".into()));
            }
        }
        Ok(report)
    }
}

#[test]
fn failed_project_is_not_overlaid() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let remapper = HalfDone(engine(TABLE));
    let pair = Syncer::new(&mirror, &remapper, Default::default(), "mojang")
        .init()
        .expect("init");

    let repo = mirror.repo();
    assert_eq!(read_file(repo, pair.derived, USE_JAVA), Some(use_source("")));
    assert_eq!(read_file(repo, pair.derived, DATA_TXT).as_deref(), Some("v1\n"));
}
