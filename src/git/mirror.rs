//! The local mirror of upstream where replays happen.

use std::fs;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{
    BranchType, FetchOptions, IndexAddOption, Oid, RemoteCallbacks, Repository, ResetType,
    Signature,
};
use walkdir::WalkDir;

use crate::rewrite::RemapReport;

use super::alignment::{ALIGNMENT_FILE, AlignmentLog};
use super::error::SyncError;
use super::topology::BranchTopology;

/// A non-bare repository with an `upstream` and a `root` remote.
pub struct Mirror {
    repo: Repository,
    workdir: PathBuf,
    root: PathBuf,
    topology: BranchTopology,
}

impl std::fmt::Debug for Mirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mirror")
            .field("workdir", &self.workdir)
            .field("root", &self.root)
            .field("topology", &self.topology)
            .finish()
    }
}

impl Mirror {
    /// Opens the mirror at `dir`, creating it and its remotes when missing.
    pub fn open_or_init(
        dir: &Path,
        root: &Path,
        upstream_url: &str,
        topology: BranchTopology,
    ) -> Result<Self, SyncError> {
        let repo = if dir.join(".git").exists() {
            Repository::open(dir).map_err(|e| SyncError::OpenRepo(dir.to_path_buf(), e))?
        } else {
            tracing::info!(dir = %dir.display(), "initializing mirror");
            fs::create_dir_all(dir).map_err(|e| SyncError::io(dir, e))?;
            Repository::init(dir).map_err(|e| SyncError::InitMirror(dir.to_path_buf(), e))?
        };
        let root = root
            .canonicalize()
            .map_err(|e| SyncError::io(root, e))?;
        let root_url = root.to_string_lossy().into_owned();
        ensure_remote(&repo, &topology.upstream_remote, upstream_url)?;
        ensure_remote(&repo, &topology.root_remote, &root_url)?;
        Self::from_repo(repo, root, topology)
    }

    /// Opens an existing mirror; `None` when it was never initialized.
    pub fn open(dir: &Path, root: &Path, topology: BranchTopology) -> Result<Option<Self>, SyncError> {
        if !dir.join(".git").exists() {
            return Ok(None);
        }
        let repo = Repository::open(dir).map_err(|e| SyncError::OpenRepo(dir.to_path_buf(), e))?;
        let root = root.canonicalize().map_err(|e| SyncError::io(root, e))?;
        Self::from_repo(repo, root, topology).map(Some)
    }

    fn from_repo(repo: Repository, root: PathBuf, topology: BranchTopology) -> Result<Self, SyncError> {
        let workdir = repo
            .workdir()
            .ok_or_else(|| SyncError::Bare(repo.path().to_path_buf()))?
            .to_path_buf();
        Ok(Self {
            repo,
            workdir,
            root,
            topology,
        })
    }

    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Work tree of the root repository.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn topology(&self) -> &BranchTopology {
        &self.topology
    }

    pub fn alignment_log(&self) -> Result<AlignmentLog, SyncError> {
        AlignmentLog::load(&self.repo.path().join(ALIGNMENT_FILE))
    }

    pub fn fetch_upstream(&self) -> Result<(), SyncError> {
        self.fetch(&self.topology.upstream_remote, &self.topology.upstream_refspec())
    }

    pub fn fetch_root(&self) -> Result<(), SyncError> {
        self.fetch(&self.topology.root_remote, &self.topology.root_refspec())
    }

    fn fetch(&self, remote: &str, refspec: &str) -> Result<(), SyncError> {
        let fetch_err = |source| SyncError::Fetch {
            remote: remote.to_string(),
            source,
        };
        let mut handle = self.repo.find_remote(remote).map_err(fetch_err)?;
        let mut options = fetch_options(&self.repo);
        handle
            .fetch(&[refspec], Some(&mut options), None)
            .map_err(fetch_err)?;
        tracing::debug!(remote, refspec, "fetched");
        Ok(())
    }

    /// Tip of local branch `branch`.
    pub fn branch_tip(&self, branch: &str) -> Result<Option<Oid>, SyncError> {
        resolve(&self.repo, &BranchTopology::local_ref(branch))
    }

    /// Tip of local branch `branch`, which must exist.
    pub fn require_tip(&self, branch: &str) -> Result<Oid, SyncError> {
        self.branch_tip(branch)?
            .ok_or_else(|| SyncError::NoLocalRef(branch.to_string()))
    }

    pub fn upstream_tip(&self) -> Result<Oid, SyncError> {
        let name = self.topology.upstream_ref();
        resolve(&self.repo, &name)?.ok_or(SyncError::NoRemoteRef(name))
    }

    /// The root repository's copy of `branch`, as last fetched.
    pub fn root_tip(&self, branch: &str) -> Result<Option<Oid>, SyncError> {
        resolve(&self.repo, &self.topology.root_ref(branch))
    }

    /// Points `branch` at `oid`, creating it when needed.
    pub fn set_branch(&self, branch: &str, oid: Oid) -> Result<(), SyncError> {
        self.repo.find_commit(oid)?;
        self.repo
            .reference(&BranchTopology::local_ref(branch), oid, true, "remap-sync")?;
        Ok(())
    }

    pub fn has_branch(&self, branch: &str) -> bool {
        self.repo.find_branch(branch, BranchType::Local).is_ok()
    }

    /// Checks out `branch`, discarding local changes and untracked files.
    pub fn checkout_branch(&self, branch: &str) -> Result<(), SyncError> {
        let checkout_err = |source| SyncError::Checkout {
            target: branch.to_string(),
            source,
        };
        self.repo
            .set_head(&BranchTopology::local_ref(branch))
            .map_err(checkout_err)?;
        self.repo
            .checkout_head(Some(&mut forced()))
            .map_err(checkout_err)?;
        Ok(())
    }

    /// Checks out `oid` on a detached head.
    pub fn checkout_detached(&self, oid: Oid) -> Result<(), SyncError> {
        let checkout_err = |source| SyncError::Checkout {
            target: oid.to_string(),
            source,
        };
        self.repo.set_head_detached(oid).map_err(checkout_err)?;
        self.repo
            .checkout_head(Some(&mut forced()))
            .map_err(checkout_err)?;
        Ok(())
    }

    /// Hard-resets the current branch to `oid` and clears any operation in
    /// progress.
    pub fn hard_reset(&self, oid: Oid) -> Result<(), SyncError> {
        reset_hard(&self.repo, oid)
    }

    /// Replaces `<project>/src` in the work tree with every project `src`
    /// found in `output`, except projects `report` lists as failed. Their
    /// output may be partial, so the work tree copy is kept. Returns the
    /// replaced project names.
    pub fn overlay(&self, output: &Path, report: &RemapReport) -> Result<Vec<String>, SyncError> {
        let failed: Vec<&str> = report.failed().map(|(name, _)| name).collect();
        let mut projects = remapped_projects(output)?;
        projects.retain(|name| {
            let keep = !failed.contains(&name.as_str());
            if !keep {
                tracing::warn!(project = %name, "remap failed, keeping unmapped sources");
            }
            keep
        });
        for name in &projects {
            let dest = self.workdir.join(name).join("src");
            if dest.exists() {
                fs::remove_dir_all(&dest).map_err(|e| SyncError::io(&dest, e))?;
            }
            copy_tree(&output.join(name).join("src"), &dest)?;
        }
        tracing::debug!(projects = projects.len(), "copied remapped sources");
        Ok(projects)
    }

    /// Stages every change in the work tree, deletions included. Returns the
    /// written tree.
    pub fn stage_all(&self) -> Result<Oid, SyncError> {
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;
        Ok(index.write_tree()?)
    }

    /// Commits `tree` on the checked out branch.
    pub fn commit_tree(
        &self,
        tree: Oid,
        parent: Oid,
        author: &Signature<'_>,
        committer: &Signature<'_>,
        message: &str,
    ) -> Result<Oid, SyncError> {
        let tree = self.repo.find_tree(tree)?;
        let parent = self.repo.find_commit(parent)?;
        self.repo
            .commit(Some("HEAD"), author, committer, message, &tree, &[&parent])
            .map_err(SyncError::Commit)
    }

    /// Signature for commits this tool authors itself.
    pub fn own_signature(&self) -> Result<Signature<'static>, SyncError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig.to_owned()),
            Err(_) => Ok(Signature::now("remap-sync", "remap-sync@localhost")?),
        }
    }
}

/// Projects in a remap output directory, i.e. children holding a `src` dir.
fn remapped_projects(output: &Path) -> Result<Vec<String>, SyncError> {
    let mut projects = Vec::new();
    let entries = fs::read_dir(output).map_err(|e| SyncError::io(output, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| SyncError::io(output, e))?;
        if entry.path().join("src").is_dir() {
            projects.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    projects.sort();
    Ok(projects)
}

fn forced() -> CheckoutBuilder<'static> {
    let mut checkout = CheckoutBuilder::new();
    checkout.force().remove_untracked(true);
    checkout
}

pub(crate) fn reset_hard(repo: &Repository, oid: Oid) -> Result<(), SyncError> {
    let target = repo.find_object(oid, None)?;
    repo.cleanup_state()?;
    repo.reset(&target, ResetType::Hard, Some(&mut forced()))?;
    Ok(())
}

fn resolve(repo: &Repository, name: &str) -> Result<Option<Oid>, SyncError> {
    match repo.refname_to_id(name) {
        Ok(oid) => Ok(Some(oid)),
        Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn ensure_remote(repo: &Repository, name: &str, url: &str) -> Result<(), SyncError> {
    match repo.find_remote(name) {
        Ok(remote) if remote.url() == Some(url) => Ok(()),
        Ok(_) => {
            repo.remote_set_url(name, url)?;
            Ok(())
        }
        Err(_) => {
            repo.remote(name, url)?;
            tracing::debug!(remote = name, url, "added remote");
            Ok(())
        }
    }
}

pub(crate) fn fetch_options(repo: &Repository) -> FetchOptions<'static> {
    let cfg = repo.config().ok();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |url, username_from_url, allowed| {
        if allowed.is_ssh_key()
            && let Some(user) = username_from_url
        {
            return git2::Cred::ssh_key_from_agent(user);
        }
        if allowed.is_user_pass_plaintext()
            && let Some(ref cfg) = cfg
            && let Ok(cred) = git2::Cred::credential_helper(cfg, url, username_from_url)
        {
            return Ok(cred);
        }
        git2::Cred::default()
    });
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), SyncError> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(from).to_path_buf();
            SyncError::io(path, std::io::Error::other(e))
        })?;
        let Ok(rel) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(|e| SyncError::io(&dest, e))?;
        } else if entry.file_type().is_file() {
            fs::copy(entry.path(), &dest).map_err(|e| SyncError::io(entry.path(), e))?;
        }
    }
    Ok(())
}
