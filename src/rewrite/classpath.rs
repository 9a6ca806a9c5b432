//! Index of class names available on the classpath.
//!
//! Only names are indexed. They let the rewriter tell a known class that
//! keeps its name apart from an identifier that is not a class at all.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::archive::{ArchiveKind, list_entries};
use super::error::RewriteError;

#[derive(Debug, Clone, Default)]
pub struct ClassIndex {
    classes: HashSet<String>,
}

impl ClassIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indexes directories (`.class` and `.java` files below them) and
    /// jar/zip/tar archives. Missing entries are skipped with a warning.
    pub fn from_entries(entries: &[PathBuf]) -> Result<Self, RewriteError> {
        let mut index = ClassIndex::new();
        for entry in entries {
            if entry.is_dir() {
                index.add_dir(entry)?;
            } else if entry.is_file() {
                index.add_archive(entry)?;
            } else {
                tracing::warn!(path = %entry.display(), "classpath entry does not exist");
            }
        }
        tracing::debug!(classes = index.len(), "indexed classpath");
        Ok(index)
    }

    pub fn insert(&mut self, internal: impl Into<String>) {
        self.classes.insert(internal.into());
    }

    pub fn contains(&self, internal: &str) -> bool {
        self.classes.contains(internal)
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.classes.iter().map(String::as_str)
    }

    fn add_dir(&mut self, root: &Path) -> Result<(), RewriteError> {
        for entry in WalkDir::new(root) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(root).to_path_buf();
                RewriteError::io(path, std::io::Error::other(e))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Ok(rel) = entry.path().strip_prefix(root)
                && let Some(name) = class_name_of(&rel.to_string_lossy())
            {
                self.insert(name);
            }
        }
        Ok(())
    }

    fn add_archive(&mut self, path: &Path) -> Result<(), RewriteError> {
        if ArchiveKind::detect(path).is_none() {
            tracing::debug!(path = %path.display(), "skipping non-archive classpath file");
            return Ok(());
        }
        for name in list_entries(path)? {
            if let Some(class) = class_name_of(&name) {
                self.insert(class);
            }
        }
        Ok(())
    }
}

/// `a/b/C$D.class` or `a/b/C.java` -> `a/b/C$D` / `a/b/C`.
fn class_name_of(rel: &str) -> Option<String> {
    let rel = rel.replace('\\', "/");
    let stem = rel
        .strip_suffix(".class")
        .or_else(|| rel.strip_suffix(".java"))?;
    let stem = stem.trim_start_matches('/');
    if stem.ends_with("module-info") || stem.ends_with("package-info") {
        return None;
    }
    Some(stem.to_string())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn indexes_directory_classes_and_sources() {
        let dir = tempfile::TempDir::new().unwrap();
        let pkg = dir.path().join("net/minecraft");
        fs::create_dir_all(&pkg).unwrap();
        fs::write(pkg.join("Entity.class"), b"").unwrap();
        fs::write(pkg.join("Entity$Removal.class"), b"").unwrap();
        fs::write(pkg.join("World.java"), b"").unwrap();
        fs::write(pkg.join("package-info.java"), b"").unwrap();
        fs::write(pkg.join("notes.txt"), b"").unwrap();

        let index = ClassIndex::from_entries(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(index.len(), 3);
        assert!(index.contains("net/minecraft/Entity$Removal"));
        assert!(index.contains("net/minecraft/World"));
    }

    #[test]
    fn missing_entries_are_skipped() {
        let index = ClassIndex::from_entries(&[PathBuf::from("/nonexistent/classes")]).unwrap();
        assert!(index.is_empty());
    }
}
