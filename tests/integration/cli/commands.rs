//! Commands driven through the CLI entry point with a repo config file.

use std::fs;
use std::path::Path;

use remap_sync::cli::{parse_from, run};
use remap_sync::config::ConfigError;

use crate::fixtures::git::{init_repo, read_file};
use crate::fixtures::rig::{DATA_TXT, SyncRig, TABLE, USE_JAVA, use_remapped};

fn run_cli(root: &Path, args: &[&str]) -> remap_sync::Result<()> {
    let mut argv = vec![
        "remap-sync".to_string(),
        "--repo".to_string(),
        root.to_string_lossy().into_owned(),
    ];
    argv.extend(args.iter().map(|a| a.to_string()));
    run(parse_from(argv))
}

#[test]
fn init_and_sync_from_repo_config() {
    let rig = SyncRig::new();
    let table = rig.path().join("composed.mappings");
    fs::write(&table, TABLE).unwrap();
    let mirror_dir = rig.mirror_dir("cli");
    let config = format!(
        "[upstream]\nurl = '{}'\nbranch = 'main'\n\n[mirror]\ndir = '{}'\n\n[mappings]\noutput = '{}'\n\n[remap]\nworkers = 1\n",
        rig.upstream_url(),
        mirror_dir.display(),
        table.display()
    );
    fs::write(rig.root_dir().join("remap-sync.toml"), config).unwrap();

    run_cli(&rig.root_dir(), &["init"]).expect("init");
    let derived = rig.published("remapped/main").expect("derived branch published");
    assert_eq!(read_file(&rig.root, derived, USE_JAVA), Some(use_remapped("")));

    let u1 = rig.commit_upstream(&[(DATA_TXT, Some("v2\n"))], "Bob", "Bump data");
    run_cli(&rig.root_dir(), &["sync", "--max-commits", "3"]).expect("sync");
    assert_eq!(rig.published("upstream/main"), Some(u1));
    let synced = rig.published("remapped/main").unwrap();
    assert_eq!(read_file(&rig.root, synced, DATA_TXT).as_deref(), Some("v2\n"));

    run_cli(&rig.root_dir(), &["--json", "status"]).expect("status");
}

#[test]
fn sync_without_upstream_url_is_a_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    init_repo(dir.path(), "trunk").unwrap();
    fs::write(dir.path().join("remap-sync.toml"), "[sync]\nmax_commits = 2\n").unwrap();

    let err = run_cli(dir.path(), &["sync"]).expect_err("url is required");
    assert!(
        matches!(err, remap_sync::Error::Config(ConfigError::Missing("upstream.url"))),
        "{err:?}"
    );
}

#[test]
fn compose_and_merge_resolve_paths_from_root() {
    let dir = tempfile::TempDir::new().unwrap();
    let root = dir.path();
    fs::write(
        root.join("named.mappings"),
        "remap-mappings v1 official named\na net/minecraft/Entity\n\tf I b age\n",
    )
    .unwrap();
    fs::write(
        root.join("mojang.mappings"),
        "remap-mappings v1 official mojang\na net/minecraft/world/entity/Entity\n\tf I b tickCount\n",
    )
    .unwrap();
    fs::write(root.join("a.accesswidener"), "accessWidener v1 named\naccessible class a/A\n").unwrap();
    fs::write(root.join("b.accesswidener"), "accessWidener v2 named\naccessible class b/B\n").unwrap();

    run_cli(
        root,
        &["compose", "--primary", "named.mappings", "--secondary", "mojang.mappings", "-o", "out/composed.mappings"],
    )
    .expect("compose");
    let composed = fs::read_to_string(root.join("out/composed.mappings")).unwrap();
    assert!(composed.starts_with("remap-mappings v1 named mojang\n"), "{composed}");
    assert!(composed.contains("net/minecraft/Entity net/minecraft/world/entity/Entity"));
    assert!(composed.contains("\tf I age tickCount"));

    run_cli(root, &["merge", "a.accesswidener", "b.accesswidener", "-o", "merged.accesswidener"])
        .expect("merge");
    let merged = fs::read_to_string(root.join("merged.accesswidener")).unwrap();
    assert_eq!(
        merged,
        "accessWidener\tv2\tnamed\naccessible\tclass\ta/A\naccessible\tclass\tb/B\n"
    );
}

#[test]
fn setup_collects_injected_interfaces_from_the_mirror() {
    let metadata = r#"{"id": "core", "custom": {"loom:injected_interfaces": {"net/a/Old": ["net/a/Extra"]}}}"#;
    let rig = SyncRig::with_seed(&[("core/src/main/resources/fabric.mod.json", Some(metadata))]);
    let table = rig.path().join("composed.mappings");
    fs::write(&table, TABLE).unwrap();
    let config = format!(
        "[upstream]\nurl = '{}'\n\n[mirror]\ndir = '{}'\n\n[mappings]\noutput = '{}'\n\n[remap]\nworkers = 1\n",
        rig.upstream_url(),
        rig.mirror_dir("cli").display(),
        table.display()
    );
    fs::write(rig.root_dir().join("remap-sync.toml"), config).unwrap();

    run_cli(&rig.root_dir(), &["init"]).expect("init");
    run_cli(&rig.root_dir(), &["setup"]).expect("setup");

    let written = rig
        .root_dir()
        .join("src/generated/resources/architectury.common.json");
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(written).unwrap()).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "injected_interfaces": { "net/a/Old": ["net/a/Extra"] } })
    );
}

#[test]
fn setup_without_mirror_reports_uninitialized() {
    let dir = tempfile::TempDir::new().unwrap();
    init_repo(dir.path(), "trunk").unwrap();
    let mirror = dir.path().join("no-mirror");
    fs::write(
        dir.path().join("remap-sync.toml"),
        format!("[mirror]\ndir = '{}'\n", mirror.display()),
    )
    .unwrap();

    let err = run_cli(dir.path(), &["setup"]).expect_err("mirror is required");
    assert!(
        matches!(err, remap_sync::Error::Sync(remap_sync::git::SyncError::Uninitialized(_))),
        "{err:?}"
    );
}
