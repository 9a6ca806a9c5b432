//! Project discovery and the per-project remap job.
//!
//! A project is a top-level directory of the upstream tree. Its `src/`
//! children are source sets; each set's `java` root is rewritten and every
//! other file is copied. The output of a project is always a complete `src/`
//! tree so it can replace the derived copy wholesale.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::access::remap_descriptor_file;
use crate::mapping::Remapper;

use super::archive::{ArchiveKind, SourceRoot};
use super::error::{RemapWarning, RewriteError};
use super::mixin::{MixinHints, collect_hints};
use super::unit::{RewriteContext, rewrite_unit};

/// Which directories are projects and where their access descriptor is
/// declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLayout {
    /// Name prefix of project directories. Empty accepts every directory.
    pub project_prefix: String,
    pub excluded: Vec<String>,
    /// Resource file declaring the access descriptor path.
    pub metadata_file: String,
    pub descriptor_key: String,
    /// Namespace written to remapped descriptor headers.
    pub header_namespace: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            project_prefix: String::new(),
            excluded: Vec::new(),
            metadata_file: "fabric.mod.json".into(),
            descriptor_key: "accessWidener".into(),
            header_namespace: "named".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    pub root: PathBuf,
}

/// Lists project directories of `tree`, sorted by name.
pub fn discover_projects(tree: &Path, layout: &ProjectLayout) -> Result<Vec<Project>, RewriteError> {
    let mut projects = Vec::new();
    for entry in fs::read_dir(tree).map_err(|e| RewriteError::io(tree, e))? {
        let entry = entry.map_err(|e| RewriteError::io(tree, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.')
            || !name.starts_with(&layout.project_prefix)
            || layout.excluded.contains(&name)
            || !entry.path().is_dir()
        {
            continue;
        }
        projects.push(Project {
            name,
            root: entry.path(),
        });
    }
    projects.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(projects)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectStats {
    /// Compilation units written.
    pub units: usize,
    /// Units with at least one edit.
    pub rewritten: usize,
    /// Files copied unchanged.
    pub copied: usize,
    pub descriptors: usize,
    pub warnings: Vec<RemapWarning>,
}

/// Remaps one project into `<output>/<project>/src`, replacing whatever was
/// there.
pub fn remap_project(
    project: &Project,
    output: &Path,
    ctx: &RewriteContext<'_>,
    layout: &ProjectLayout,
) -> Result<ProjectStats, RewriteError> {
    let _span = tracing::info_span!("remap_project", project = %project.name).entered();
    let src = project.root.join("src");
    let out_src = output.join(&project.name).join("src");
    if out_src.exists() {
        fs::remove_dir_all(&out_src).map_err(|e| RewriteError::io(&out_src, e))?;
    }

    let mut stats = ProjectStats::default();
    if !src.is_dir() {
        tracing::debug!("project has no src directory");
        return Ok(stats);
    }

    for set in sorted_children(&src)? {
        let Some(set_name) = set.file_name() else {
            continue;
        };
        let out_set = out_src.join(set_name);
        if !set.is_dir() {
            copy_file(&set, &out_set)?;
            stats.copied += 1;
            continue;
        }
        for child in sorted_children(&set)? {
            let Some(name) = child.file_name() else {
                continue;
            };
            if is_java_root(&child) {
                remap_java_root(&child, &out_set.join("java"), ctx, &mut stats)?;
            } else if child.is_dir() {
                stats.copied += copy_tree(&child, &out_set.join(name))?;
            } else {
                copy_file(&child, &out_set.join(name))?;
                stats.copied += 1;
            }
        }
        let resources = out_set.join("resources");
        if resources.is_dir()
            && let Err(err) = remap_declared_descriptor(&resources, ctx.remapper(), layout, &mut stats)
        {
            let path = Path::new(set_name).join("resources").join(&layout.metadata_file);
            tracing::warn!(path = %path.display(), error = %err, "access descriptor left unmapped");
            stats.warnings.push(RemapWarning {
                path,
                reason: err.to_string(),
            });
        }
    }

    tracing::info!(
        units = stats.units,
        rewritten = stats.rewritten,
        copied = stats.copied,
        warnings = stats.warnings.len(),
        "project remapped"
    );
    Ok(stats)
}

/// `java/`, or a packaged `java.zip`/`java.tar.gz`.
fn is_java_root(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    (name == "java" && path.is_dir())
        || (name.starts_with("java.") && path.is_file() && ArchiveKind::detect(path).is_some())
}

fn remap_java_root(
    root: &Path,
    out: &Path,
    ctx: &RewriteContext<'_>,
    stats: &mut ProjectStats,
) -> Result<(), RewriteError> {
    let root = SourceRoot::open(root)?;
    let files = relative_files(root.path())?;
    let units: Vec<&PathBuf> = files.iter().filter(|rel| is_unit(rel)).collect();
    let hints = mixin_prepass(root.path(), &units, ctx);

    for rel in &files {
        let path = root.path().join(rel);
        if !is_unit(rel) {
            copy_file(&path, &out.join(rel))?;
            stats.copied += 1;
            continue;
        }
        let rewritten = fs::read_to_string(&path)
            .map_err(|e| RewriteError::io(&path, e))
            .and_then(|source| {
                let stem = rel.file_stem().and_then(|s| s.to_str());
                rewrite_unit(&source, stem, ctx, hints.get(rel))
            });
        match rewritten {
            Ok(unit) => {
                let dest = match &unit.primary {
                    Some((from, to)) if from != to && unit_path(rel) == format!("{from}.java") => {
                        PathBuf::from(format!("{to}.java"))
                    }
                    _ => rel.clone(),
                };
                write_file(&out.join(dest), unit.text.as_bytes())?;
                stats.units += 1;
                if unit.edits > 0 {
                    stats.rewritten += 1;
                }
            }
            Err(err) => {
                tracing::warn!(path = %rel.display(), error = %err, "unit left unmapped");
                stats.warnings.push(RemapWarning {
                    path: rel.clone(),
                    reason: err.to_string(),
                });
                copy_file(&path, &out.join(rel))?;
                stats.copied += 1;
            }
        }
    }
    Ok(())
}

/// Resolves mixin annotation literals up front. Failures are logged and the
/// unit is rewritten without hints.
fn mixin_prepass(root: &Path, units: &[&PathBuf], ctx: &RewriteContext<'_>) -> HashMap<PathBuf, MixinHints> {
    let mut cache = HashMap::new();
    for rel in units {
        let path = root.join(rel);
        let collected = fs::read_to_string(&path)
            .map_err(|e| RewriteError::io(&path, e))
            .and_then(|source| collect_hints(&source, ctx));
        match collected {
            Ok(Some(hints)) => {
                tracing::debug!(path = %rel.display(), targets = hints.targets.len(), "mixin hints");
                cache.insert((*rel).clone(), hints);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(path = %rel.display(), error = %err, "mixin pre-pass failed"),
        }
    }
    cache
}

/// Remaps the access descriptor named by the metadata file, in place in the
/// output resources. On failure the copied descriptor is left as it was.
fn remap_declared_descriptor(
    resources: &Path,
    remapper: &Remapper,
    layout: &ProjectLayout,
    stats: &mut ProjectStats,
) -> Result<(), RewriteError> {
    let metadata = resources.join(&layout.metadata_file);
    if !metadata.is_file() {
        return Ok(());
    }
    let text = fs::read_to_string(&metadata).map_err(|e| RewriteError::io(&metadata, e))?;
    let json: serde_json::Value = serde_json::from_str(&text).map_err(|source| RewriteError::Metadata {
        path: metadata.clone(),
        source,
    })?;
    let Some(declared) = json.get(&layout.descriptor_key).and_then(serde_json::Value::as_str) else {
        return Ok(());
    };
    let descriptor = resources.join(declared);
    if !descriptor.is_file() {
        tracing::warn!(path = %descriptor.display(), "declared access descriptor is missing");
        return Ok(());
    }
    let remapped = remap_descriptor_file(&descriptor, &descriptor, remapper, &layout.header_namespace)?;
    tracing::debug!(
        path = %declared,
        misses = remapped.misses.len(),
        "access descriptor remapped"
    );
    stats.descriptors += 1;
    Ok(())
}

fn is_unit(rel: &Path) -> bool {
    rel.extension().is_some_and(|ext| ext == "java")
}

fn unit_path(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    let mut children = fs::read_dir(dir)
        .map_err(|e| RewriteError::io(dir, e))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RewriteError::io(dir, e))?;
    children.sort();
    Ok(children)
}

/// Files below `root`, relative and sorted.
fn relative_files(root: &Path) -> Result<Vec<PathBuf>, RewriteError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            RewriteError::io(path, std::io::Error::other(e))
        })?;
        if entry.file_type().is_file()
            && let Ok(rel) = entry.path().strip_prefix(root)
        {
            files.push(rel.to_path_buf());
        }
    }
    Ok(files)
}

fn copy_tree(from: &Path, to: &Path) -> Result<usize, RewriteError> {
    let files = relative_files(from)?;
    for rel in &files {
        copy_file(&from.join(rel), &to.join(rel))?;
    }
    Ok(files.len())
}

fn copy_file(from: &Path, to: &Path) -> Result<(), RewriteError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|e| RewriteError::io(parent, e))?;
    }
    fs::copy(from, to).map_err(|e| RewriteError::io(from, e))?;
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), RewriteError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RewriteError::io(parent, e))?;
    }
    fs::write(path, bytes).map_err(|e| RewriteError::io(path, e))
}
