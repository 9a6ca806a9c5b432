//! An upstream repository, a root repository and a mirror location, all in
//! one temp dir.

use std::path::{Path, PathBuf};

use git2::{Oid, Repository};
use remap_sync::git::{BranchNames, BranchTopology, Mirror, SyncSettings, Syncer};
use remap_sync::mapping::{Remapper, parse_mappings};
use remap_sync::rewrite::{ClassIndex, InProcessRemapper, ProjectLayout};
use tempfile::TempDir;

use super::git::{commit_files, init_repo};

pub const VERSION: &str = "main";

pub const TABLE: &str = "remap-mappings v1 named mojang\nnet/a/Old net/b/New\n";

pub const USE_JAVA: &str = "core/src/main/java/net/a/Use.java";
pub const DATA_TXT: &str = "core/src/main/resources/data.txt";

pub fn use_source(body: &str) -> String {
    format!("package net.a;\nclass Use {{ Old old;{body} }}\n")
}

pub fn use_remapped(body: &str) -> String {
    format!("package net.a;\nimport net.b.New;\nclass Use {{ New old;{body} }}\n")
}

/// Built-in remapper over a `named -> mojang` table.
pub fn engine(table: &str) -> InProcessRemapper {
    let remapper = Remapper::new(&parse_mappings(table).expect("table"), "named", "mojang")
        .expect("remapper");
    InProcessRemapper::new(remapper, ClassIndex::new(), ProjectLayout::default()).with_workers(1)
}

pub struct SyncRig {
    dir: TempDir,
    pub upstream: Repository,
    pub root: Repository,
    engine: InProcessRemapper,
}

impl SyncRig {
    /// Upstream holds one project with a Java unit and a resource.
    pub fn new() -> Self {
        Self::with_seed(&[])
    }

    /// Like [`SyncRig::new`] with `extra` files in the first upstream commit.
    pub fn with_seed(extra: &[(&str, Option<&str>)]) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let upstream = init_repo(&dir.path().join("upstream"), VERSION).expect("init upstream");
        let use_java = use_source("");
        let mut seed = vec![
            (USE_JAVA, Some(use_java.as_str())),
            (DATA_TXT, Some("v1\n")),
            ("README.md", Some("upstream\n")),
        ];
        seed.extend_from_slice(extra);
        commit_files(&upstream, &seed, "Alice", "Initial import").expect("seed upstream");

        let root = init_repo(&dir.path().join("root"), "trunk").expect("init root");
        commit_files(&root, &[("build.toml", Some("[mirror]\n"))], "Maintainer", "Root")
            .expect("seed root");

        Self {
            dir,
            upstream,
            root,
            engine: engine(TABLE),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn upstream_url(&self) -> String {
        self.dir.path().join("upstream").to_string_lossy().into_owned()
    }

    pub fn root_dir(&self) -> PathBuf {
        self.dir.path().join("root")
    }

    pub fn mirror_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join("mirrors").join(name)
    }

    pub fn topology(&self) -> BranchTopology {
        BranchTopology::new(VERSION, &BranchNames::default())
    }

    pub fn mirror(&self) -> Mirror {
        self.mirror_at(&self.mirror_dir("default"))
    }

    pub fn mirror_at(&self, dir: &Path) -> Mirror {
        Mirror::open_or_init(dir, &self.root_dir(), &self.upstream_url(), self.topology()).expect("open mirror")
    }

    pub fn syncer<'a>(&'a self, mirror: &'a Mirror) -> Syncer<'a> {
        Syncer::new(mirror, &self.engine, SyncSettings::default(), "mojang")
    }

    pub fn commit_upstream(&self, files: &[(&str, Option<&str>)], author: &str, message: &str) -> Oid {
        commit_files(&self.upstream, files, author, message).expect("upstream commit")
    }

    /// Tip of a branch published in the root repository.
    pub fn published(&self, branch: &str) -> Option<Oid> {
        super::git::branch_tip(&self.root_dir(), branch).expect("root branch")
    }
}
