//! Injected interface declarations gathered from project metadata.
//!
//! Projects declare interfaces the loader injects into game classes under
//! `custom."loom:injected_interfaces"` of their metadata file. The merged
//! declarations of every project are written to one JSON file for tooling
//! that reads them from a single place.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::RewriteError;
use super::project::{ProjectLayout, discover_projects};

/// Source sets whose resources may declare injected interfaces.
pub const INTERFACE_SOURCE_SETS: [&str; 2] = ["main", "client"];

/// Target class to the interfaces injected into it.
pub type InjectedInterfaces = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    custom: Option<Custom>,
}

#[derive(Debug, Default, Deserialize)]
struct Custom {
    #[serde(rename = "loom:injected_interfaces", default)]
    injected_interfaces: BTreeMap<String, Vec<String>>,
}

#[derive(Debug, Serialize)]
struct InterfacesFile<'a> {
    injected_interfaces: &'a InjectedInterfaces,
}

/// Merges the injected interfaces declared by every project of `tree`.
/// Interfaces for the same class accumulate across projects.
pub fn collect_injected_interfaces(
    tree: &Path,
    layout: &ProjectLayout,
) -> Result<InjectedInterfaces, RewriteError> {
    let mut found = InjectedInterfaces::new();
    for project in discover_projects(tree, layout)? {
        for set in INTERFACE_SOURCE_SETS {
            let path = project
                .root
                .join("src")
                .join(set)
                .join("resources")
                .join(&layout.metadata_file);
            if !path.is_file() {
                continue;
            }
            let text = fs::read_to_string(&path).map_err(|e| RewriteError::io(&path, e))?;
            let metadata: Metadata = serde_json::from_str(&text).map_err(|source| RewriteError::Metadata {
                path: path.clone(),
                source,
            })?;
            let Some(custom) = metadata.custom else {
                continue;
            };
            if custom.injected_interfaces.is_empty() {
                continue;
            }
            tracing::info!(project = %project.name, source_set = set, "adding injected interfaces");
            for (class, interfaces) in custom.injected_interfaces {
                found.entry(class).or_default().extend(interfaces);
            }
        }
    }
    for (class, interfaces) in &found {
        tracing::debug!(%class, interfaces = ?interfaces, "injected interfaces");
    }
    Ok(found)
}

/// Writes `{"injected_interfaces": {...}}` to `path`, replacing it atomically.
pub fn write_injected_interfaces(path: &Path, interfaces: &InjectedInterfaces) -> Result<(), RewriteError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| RewriteError::io(dir, e))?;
    let mut text = serde_json::to_string_pretty(&InterfacesFile {
        injected_interfaces: interfaces,
    })
    .map_err(|source| RewriteError::Metadata {
        path: path.to_path_buf(),
        source,
    })?;
    text.push('\n');
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| RewriteError::io(dir, e))?;
    tmp.write_all(text.as_bytes())
        .map_err(|e| RewriteError::io(path, e))?;
    tmp.persist(path).map_err(|e| RewriteError::io(path, e.error))?;
    Ok(())
}
