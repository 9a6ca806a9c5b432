//! Init and commit-by-commit integration against real repositories.

use remap_sync::git::{CommitKind, SyncOutcome, Syncer};

use crate::fixtures::git::read_file;
use crate::fixtures::rig::{DATA_TXT, SyncRig, USE_JAVA, engine, use_remapped, use_source};

#[test]
fn init_publishes_tracking_and_remapped_branches() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);

    let pair = syncer.init().expect("init");
    let upstream_head = rig.upstream.head().unwrap().target().unwrap();
    assert_eq!(pair.tracking, upstream_head);
    assert_eq!(rig.published("upstream/main"), Some(pair.tracking));
    assert_eq!(rig.published("remapped/main"), Some(pair.derived));

    let repo = mirror.repo();
    let derived = repo.find_commit(pair.derived).unwrap();
    assert_eq!(derived.parent_ids().collect::<Vec<_>>(), [pair.tracking]);
    assert_eq!(derived.message(), Some("Remap sources to mojang"));
    assert_eq!(read_file(repo, pair.derived, USE_JAVA), Some(use_remapped("")));
    assert_eq!(read_file(repo, pair.derived, DATA_TXT).as_deref(), Some("v1\n"));
    assert_eq!(read_file(repo, pair.derived, "README.md").as_deref(), Some("upstream\n"));

    let again = syncer.init().expect("second init");
    assert_eq!(again, pair);
    assert_eq!(mirror.alignment_log().unwrap().len(), 1);
}

#[test]
fn integrates_plain_pick_then_remap_with_provenance() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);
    let start = syncer.init().expect("init");

    let u1 = rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "Bump data\n\nLonger body.\n");
    let u2 = rig.commit_upstream(
        &[(USE_JAVA, Some(use_source(" int n;").as_str()))],
        "Carol",
        "Count uses\n",
    );

    let summary = syncer.sync(Some(5)).expect("sync");
    assert!(summary.up_to_date);
    let kinds: Vec<_> = summary.integrated.iter().map(|i| i.kind).collect();
    assert_eq!(kinds, [CommitKind::PlainPick, CommitKind::Remap]);
    let upstreams: Vec<_> = summary.integrated.iter().map(|i| i.upstream).collect();
    assert_eq!(upstreams, [u1, u2]);
    assert!(summary.integrated[0].report.is_none());
    assert!(summary.integrated[1].report.as_ref().is_some_and(|r| r.is_clean()));

    let repo = mirror.repo();
    let d1 = repo.find_commit(summary.integrated[0].derived).unwrap();
    assert_eq!(d1.parent_ids().collect::<Vec<_>>(), [start.derived]);
    assert_eq!(d1.author().name(), Some("Bob"));
    assert_eq!(d1.committer().name(), Some("Bob"));
    assert_eq!(d1.message(), Some("Bump data\n\nLonger body.\n"));
    assert_eq!(read_file(repo, d1.id(), DATA_TXT).as_deref(), Some("v2\n"));
    assert_eq!(read_file(repo, d1.id(), USE_JAVA), Some(use_remapped("")));

    let d2 = repo.find_commit(summary.integrated[1].derived).unwrap();
    assert_eq!(d2.parent_ids().collect::<Vec<_>>(), [d1.id()]);
    assert_eq!(d2.author().name(), Some("Carol"));
    assert_eq!(read_file(repo, d2.id(), USE_JAVA), Some(use_remapped(" int n;")));
    assert_eq!(read_file(repo, d2.id(), DATA_TXT).as_deref(), Some("v2\n"));

    assert_eq!(rig.published("upstream/main"), Some(u2));
    assert_eq!(rig.published("remapped/main"), Some(d2.id()));
    let log = mirror.alignment_log().unwrap();
    let tracked: Vec<_> = log.pairs().iter().map(|p| p.tracking).collect();
    assert_eq!(tracked, [start.tracking, u1, u2]);
}

#[test]
fn sync_stops_at_commit_limit() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);
    syncer.init().expect("init");

    let u1 = rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "one");
    let u2 = rig.commit_upstream(&[(DATA_TXT, Some("v3\n"))], "Bob", "two");

    let summary = syncer.sync(None).expect("sync");
    assert_eq!(summary.integrated.len(), 1);
    assert!(!summary.up_to_date);
    assert_eq!(summary.integrated[0].upstream, u1);

    match syncer.sync_once().expect("second pass") {
        SyncOutcome::Integrated(integration) => assert_eq!(integration.upstream, u2),
        other => panic!("expected an integration, got {other:?}"),
    }
    match syncer.sync_once().expect("third pass") {
        SyncOutcome::UpToDate { tracking } => assert_eq!(tracking, u2),
        other => panic!("expected up to date, got {other:?}"),
    }
}

#[test]
fn upstream_deletion_of_remapped_file_is_resolved() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);
    syncer.init().expect("init");

    rig.commit_upstream(&[(USE_JAVA, None)], "Dana", "Drop Use");
    let summary = syncer.sync(None).expect("sync");
    let integration = &summary.integrated[0];
    assert_eq!(integration.kind, CommitKind::Remap);
    assert_eq!(integration.resolution.deleted, [USE_JAVA]);

    let repo = mirror.repo();
    assert_eq!(read_file(repo, integration.derived, USE_JAVA), None);
    assert_eq!(read_file(repo, integration.derived, DATA_TXT).as_deref(), Some("v1\n"));
    assert_eq!(rig.published("remapped/main"), Some(integration.derived));
}

#[test]
fn refresh_applies_a_changed_table_without_upstream_commits() {
    let rig = SyncRig::new();
    let mirror = rig.mirror();
    let start = rig.syncer(&mirror).init().expect("init");

    assert_eq!(rig.syncer(&mirror).refresh().expect("refresh"), None);

    let renamed = engine("remap-mappings v1 named mojang\nnet/a/Old net/c/Newer\n");
    let syncer = Syncer::new(&mirror, &renamed, Default::default(), "mojang");
    let derived = syncer.refresh().expect("refresh").expect("tree changed");

    let repo = mirror.repo();
    let commit = repo.find_commit(derived).unwrap();
    assert_eq!(commit.parent_ids().collect::<Vec<_>>(), [start.derived]);
    assert_eq!(commit.message(), Some("Update remapped sources"));
    assert_eq!(
        read_file(repo, derived, USE_JAVA).as_deref(),
        Some("package net.a;\nimport net.c.Newer;\nclass Use { Newer old; }\n")
    );
    let last = mirror.alignment_log().unwrap().last().unwrap();
    assert_eq!((last.tracking, last.derived), (start.tracking, derived));
    assert_eq!(rig.published("remapped/main"), Some(derived));
}

#[test]
fn upstream_deletion_of_two_remapped_files_resolves_in_one_pick() {
    const OTHER_JAVA: &str = "core/src/main/java/net/a/Other.java";
    let rig = SyncRig::with_seed(&[(OTHER_JAVA, Some("package net.a;\nclass Other { Old o; }\n"))]);
    let mirror = rig.mirror();
    let syncer = rig.syncer(&mirror);
    let start = syncer.init().expect("init");
    assert_eq!(
        read_file(mirror.repo(), start.derived, OTHER_JAVA).as_deref(),
        Some("package net.a;\nimport net.b.New;\nclass Other { New o; }\n")
    );

    rig.commit_upstream(&[(USE_JAVA, None), (OTHER_JAVA, None)], "Dana", "Drop both");
    let summary = syncer.sync(None).expect("sync");
    let integration = &summary.integrated[0];
    assert_eq!(integration.resolution.deleted, [OTHER_JAVA, USE_JAVA]);

    let repo = mirror.repo();
    assert_eq!(read_file(repo, integration.derived, USE_JAVA), None);
    assert_eq!(read_file(repo, integration.derived, OTHER_JAVA), None);
    assert_eq!(read_file(repo, integration.derived, DATA_TXT).as_deref(), Some("v1\n"));
    let diff = repo
        .diff_tree_to_tree(
            Some(&repo.find_commit(integration.upstream).unwrap().tree().unwrap()),
            Some(&repo.find_commit(integration.derived).unwrap().tree().unwrap()),
            None,
        )
        .unwrap();
    let touched: Vec<_> = diff
        .deltas()
        .filter_map(|d| d.new_file().path().map(|p| p.to_string_lossy().into_owned()))
        .collect();
    assert!(!touched.iter().any(|p| p == USE_JAVA || p == OTHER_JAVA), "{touched:?}");
}
