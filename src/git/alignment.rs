//! Paired-commit log of the tracking and derived branches.
//!
//! Every integrated upstream commit appends one `(tracking, derived)` pair.
//! The last pair is the last state known to be aligned; a pass starts by
//! resetting both working branches to it, so anything a crashed pass left
//! behind is discarded.

use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use git2::Oid;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::error::SyncError;

pub const ALIGNMENT_FILE: &str = "remap-alignment.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlignedPair {
    #[serde(with = "oid_hex")]
    pub tracking: Oid,
    #[serde(with = "oid_hex")]
    pub derived: Oid,
}

mod oid_hex {
    use git2::Oid;
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(oid: &Oid, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&oid.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Oid, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Oid::from_str(&hex).map_err(de::Error::custom)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LogFile {
    pairs: Vec<AlignedPair>,
}

/// Append-only, persisted after every append.
#[derive(Debug)]
pub struct AlignmentLog {
    path: PathBuf,
    pairs: Vec<AlignedPair>,
}

impl AlignmentLog {
    /// Loads the log at `path`; a missing file is an empty log.
    pub fn load(path: &Path) -> Result<Self, SyncError> {
        let pairs = match fs::read_to_string(path) {
            Ok(text) => {
                let file: LogFile =
                    serde_json::from_str(&text).map_err(|source| SyncError::AlignmentFormat {
                        path: path.to_path_buf(),
                        source,
                    })?;
                file.pairs
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(SyncError::AlignmentIo {
                    action: "read",
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(Self {
            path: path.to_path_buf(),
            pairs,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn pairs(&self) -> &[AlignedPair] {
        &self.pairs
    }

    pub fn last(&self) -> Option<AlignedPair> {
        self.pairs.last().copied()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Appends `pair` unless it equals the last entry, then persists.
    pub fn record(&mut self, pair: AlignedPair) -> Result<(), SyncError> {
        if self.last() == Some(pair) {
            return Ok(());
        }
        self.pairs.push(pair);
        self.persist()
    }

    fn persist(&self) -> Result<(), SyncError> {
        let io_err = |action, source| SyncError::AlignmentIo {
            action,
            path: self.path.clone(),
            source,
        };
        let dir = self.path.parent().unwrap_or(Path::new("."));
        let body = serde_json::to_string_pretty(&LogFile {
            pairs: self.pairs.clone(),
        })
        .map_err(|source| SyncError::AlignmentFormat {
            path: self.path.clone(),
            source,
        })?;
        let mut temp = NamedTempFile::new_in(dir).map_err(|e| io_err("create", e))?;
        temp.write_all(body.as_bytes()).map_err(|e| io_err("write", e))?;
        temp.persist(&self.path).map_err(|e| io_err("persist", e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(byte: u8) -> Oid {
        Oid::from_bytes(&[byte; 20]).unwrap()
    }

    #[test]
    fn records_and_reloads() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(ALIGNMENT_FILE);

        let mut log = AlignmentLog::load(&path).unwrap();
        assert!(log.is_empty());
        let first = AlignedPair { tracking: oid(1), derived: oid(2) };
        let second = AlignedPair { tracking: oid(3), derived: oid(4) };
        log.record(first).unwrap();
        log.record(second).unwrap();
        log.record(second).unwrap();

        let reloaded = AlignmentLog::load(&path).unwrap();
        assert_eq!(reloaded.pairs(), [first, second]);
        assert_eq!(reloaded.last(), Some(second));
    }

    #[test]
    fn malformed_log_is_reported() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(ALIGNMENT_FILE);
        fs::write(&path, "{\"pairs\": [{\"tracking\": \"zz\", \"derived\": \"00\"}]}").unwrap();
        assert!(matches!(
            AlignmentLog::load(&path).unwrap_err(),
            SyncError::AlignmentFormat { .. }
        ));
    }
}
