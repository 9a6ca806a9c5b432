use remap_sync::git::{Mirror, SyncSettings, SyncState, Syncer};

use crate::fixtures::rig::{DATA_TXT, SyncRig, USE_JAVA, use_source};

#[test]
fn status_follows_the_mirror_lifecycle() {
    let rig = SyncRig::new();
    let suffixes = SyncSettings::default().suffixes;

    let dir = rig.mirror_dir("default");
    let missing = Mirror::open(&dir, &rig.root_dir(), rig.topology()).unwrap();
    assert!(missing.is_none());
    let report = Syncer::status(missing.as_ref(), &suffixes).unwrap();
    assert_eq!(report.state, SyncState::Uninitialized);

    let mirror = rig.mirror();
    let start = rig.syncer(&mirror).init().expect("init");
    let report = Syncer::status(Some(&mirror), &suffixes).unwrap();
    assert_eq!(report.state, SyncState::UpToDate);
    assert_eq!(report.current, Some(start.tracking));
    assert_eq!(report.behind, 0);

    let u1 = rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "Bump data");
    let u2 = rig.commit_upstream(
        &[(USE_JAVA, Some(use_source(" int n;").as_str()))],
        "Carol",
        "Count uses",
    );

    // Nothing fetched yet.
    let report = Syncer::status(Some(&mirror), &suffixes).unwrap();
    assert_eq!(report.state, SyncState::UpToDate);

    mirror.fetch_upstream().unwrap();
    let report = Syncer::status(Some(&mirror), &suffixes).unwrap();
    assert_eq!(report.state, SyncState::PlainPickPending);
    assert_eq!(report.pending, Some(u1));
    assert_eq!(report.latest, Some(u2));
    assert_eq!(report.behind, 2);

    rig.syncer(&mirror).sync(None).expect("sync");
    let report = Syncer::status(Some(&mirror), &suffixes).unwrap();
    assert_eq!(report.state, SyncState::RemapPending);
    assert_eq!(report.current, Some(u1));
    assert_eq!(report.pending, Some(u2));
    assert_eq!(report.behind, 1);
}

#[test]
fn fetched_but_unaligned_mirror_reports_tracking_ready() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    mirror.fetch_upstream().unwrap();
    let head = mirror.upstream_tip().unwrap();
    mirror.set_branch(&mirror.topology().temp_tracking, head).unwrap();

    let report = Syncer::status(Some(&mirror), &SyncSettings::default().suffixes).unwrap();
    assert_eq!(report.state, SyncState::TrackingReady);
    assert_eq!(report.latest, Some(head));
    assert_eq!(report.current, None);
}
