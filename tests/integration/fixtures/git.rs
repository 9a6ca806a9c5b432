use std::fs;
use std::path::Path;

use git2::{IndexAddOption, Oid, Repository, RepositoryInitOptions, Signature};

pub fn init_repo(path: &Path, head: &str) -> Result<Repository, String> {
    let mut options = RepositoryInitOptions::new();
    options.initial_head(head);
    let repo = Repository::init_opts(path, &options)
        .map_err(|err| format!("git init failed for {path:?}: {err}"))?;
    configure_test_repo(&repo)?;
    Ok(repo)
}

fn configure_test_repo(repo: &Repository) -> Result<(), String> {
    let mut cfg = repo
        .config()
        .map_err(|err| format!("open repo config failed: {err}"))?;
    cfg.set_str("user.name", "Test")
        .map_err(|err| format!("set user.name failed: {err}"))?;
    cfg.set_str("user.email", "test@test.com")
        .map_err(|err| format!("set user.email failed: {err}"))?;
    Ok(())
}

pub fn signature(name: &str) -> Signature<'static> {
    let email = format!("{}@upstream.test", name.to_lowercase());
    Signature::now(name, &email).unwrap_or_else(|err| panic!("signature for {name}: {err}"))
}

/// Writes (`Some`) or deletes (`None`) files and commits everything on HEAD.
pub fn commit_files(
    repo: &Repository,
    files: &[(&str, Option<&str>)],
    author: &str,
    message: &str,
) -> Result<Oid, String> {
    let workdir = repo
        .workdir()
        .ok_or_else(|| "bare repository".to_string())?
        .to_path_buf();
    for (path, content) in files {
        let file = workdir.join(path);
        match content {
            Some(text) => {
                if let Some(parent) = file.parent() {
                    fs::create_dir_all(parent).map_err(|err| format!("mkdir {parent:?}: {err}"))?;
                }
                fs::write(&file, text).map_err(|err| format!("write {file:?}: {err}"))?;
            }
            None => fs::remove_file(&file).map_err(|err| format!("remove {file:?}: {err}"))?,
        }
    }

    let mut index = repo.index().map_err(|err| format!("open index: {err}"))?;
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .map_err(|err| format!("add_all: {err}"))?;
    index
        .update_all(["*"].iter(), None)
        .map_err(|err| format!("update_all: {err}"))?;
    index.write().map_err(|err| format!("write index: {err}"))?;
    let tree_id = index.write_tree().map_err(|err| format!("write tree: {err}"))?;
    let tree = repo
        .find_tree(tree_id)
        .map_err(|err| format!("find tree: {err}"))?;

    let parent = match repo.head() {
        Ok(head) => Some(
            head.peel_to_commit()
                .map_err(|err| format!("peel HEAD: {err}"))?,
        ),
        Err(_) => None,
    };
    let parents: Vec<_> = parent.iter().collect();
    let sig = signature(author);
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .map_err(|err| format!("commit failed: {err}"))
}

/// Content of `path` in the tree of `commit`, if present.
pub fn read_file(repo: &Repository, commit: Oid, path: &str) -> Option<String> {
    let commit = repo.find_commit(commit).ok()?;
    let entry = commit.tree().ok()?.get_path(Path::new(path)).ok()?;
    let blob = repo.find_blob(entry.id()).ok()?;
    Some(String::from_utf8_lossy(blob.content()).into_owned())
}

pub fn branch_tip(repo_dir: &Path, branch: &str) -> Result<Option<Oid>, String> {
    let repo = Repository::open(repo_dir)
        .map_err(|err| format!("open repo failed for {repo_dir:?}: {err}"))?;
    let refname = format!("refs/heads/{branch}");
    Ok(repo.refname_to_id(&refname).ok())
}
