//! XDG directory helpers for config/data locations.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

/// Base directory for persistent data (mirrors, logs).
///
/// Uses `REMAP_DATA_DIR` if set, otherwise `$XDG_DATA_HOME/remap-sync` or
/// `~/.local/share/remap-sync`.
pub fn data_dir() -> PathBuf {
    if let Some(dir) = thread_local_data_dir_override() {
        return dir;
    }

    if let Ok(dir) = std::env::var("REMAP_DATA_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_DATA_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".local")
                .join("share")
        })
        .join("remap-sync")
}

#[doc(hidden)]
pub struct DataDirOverride {
    prev: Option<PathBuf>,
}

impl DataDirOverride {
    pub fn new(path: Option<PathBuf>) -> Self {
        let prev = DATA_DIR_OVERRIDE.with(|cell| cell.replace(path));
        Self { prev }
    }
}

impl Drop for DataDirOverride {
    fn drop(&mut self) {
        let prev = self.prev.take();
        DATA_DIR_OVERRIDE.with(|cell| {
            cell.replace(prev);
        });
    }
}

#[doc(hidden)]
pub fn override_data_dir_for_tests(path: Option<PathBuf>) -> DataDirOverride {
    DataDirOverride::new(path)
}

fn thread_local_data_dir_override() -> Option<PathBuf> {
    DATA_DIR_OVERRIDE.with(|cell| cell.borrow().clone())
}

thread_local! {
    static DATA_DIR_OVERRIDE: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

/// Default directory for rolling log files.
pub fn logs_dir() -> PathBuf {
    data_dir().join("logs")
}

/// Default mirror location for `root` following upstream `version`.
///
/// One mirror per root work tree and version:
/// `<data>/mirrors/<root dir name>-<version>`.
pub fn mirror_dir(root: &Path, version: &str) -> PathBuf {
    let name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "root".to_string());
    let version: String = version
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    data_dir().join("mirrors").join(format!("{name}-{version}"))
}

/// Base directory for configuration files.
///
/// Uses `REMAP_CONFIG_DIR` if set, otherwise `$XDG_CONFIG_HOME/remap-sync` or
/// `~/.config/remap-sync`.
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("REMAP_CONFIG_DIR")
        && !dir.trim().is_empty()
    {
        return PathBuf::from(dir);
    }

    std::env::var("XDG_CONFIG_HOME")
        .ok()
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("/tmp"))
                .join(".config")
        })
        .join("remap-sync")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_dir_is_keyed_by_root_and_version() {
        let _guard = override_data_dir_for_tests(Some(PathBuf::from("/data")));
        assert_eq!(
            mirror_dir(Path::new("/work/mod"), "release/1.21"),
            PathBuf::from("/data/mirrors/mod-release_1.21")
        );
        assert_eq!(logs_dir(), PathBuf::from("/data/logs"));
    }
}
