//! The installed binary: exit codes and output.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary isolated from the user's config and data directories.
fn remap_sync(home: &TempDir) -> Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("remap-sync");
    cmd.env("REMAP_CONFIG_DIR", home.path().join("config"))
        .env("REMAP_DATA_DIR", home.path().join("data"))
        .env_remove("REMAP_UPSTREAM_URL")
        .env_remove("REMAP_LOG");
    cmd
}

#[test]
fn merge_reports_entry_count() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("a.accesswidener"), "accessWidener v1 named\naccessible class a/A\n").unwrap();
    fs::write(root.path().join("b.accesswidener"), "accessWidener v1 named\naccessible class a/A\n").unwrap();

    remap_sync(&home)
        .arg("--repo")
        .arg(root.path())
        .args(["merge-descriptors", "a.accesswidener", "b.accesswidener", "-o", "all.accesswidener"])
        .assert()
        .success()
        .stdout(predicate::str::contains("merged 1 entries"));
    assert!(root.path().join("all.accesswidener").exists());
}

#[test]
fn mixed_namespaces_fail_with_message() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();
    fs::write(root.path().join("a.accesswidener"), "accessWidener v1 named\n").unwrap();
    fs::write(root.path().join("b.accesswidener"), "accessWidener v1 official\n").unwrap();

    remap_sync(&home)
        .arg("--repo")
        .arg(root.path())
        .args(["merge", "a.accesswidener", "b.accesswidener", "-o", "all.accesswidener"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error:"));
    assert!(!root.path().join("all.accesswidener").exists());
}

#[test]
fn sync_requires_upstream_url() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();

    remap_sync(&home)
        .arg("--repo")
        .arg(root.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("upstream.url"));
}

#[test]
fn status_without_mirror_is_uninitialized() {
    let home = TempDir::new().unwrap();
    let root = TempDir::new().unwrap();

    remap_sync(&home)
        .arg("--repo")
        .arg(root.path())
        .args(["--json", "status"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"state\": \"uninitialized\""));
}
