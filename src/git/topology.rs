//! Branch and remote names for one tracked upstream version.

use serde::{Deserialize, Serialize};

/// Naming knobs for [`BranchTopology`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchNames {
    pub tracking_prefix: String,
    pub derived_prefix: String,
    pub temp_prefix: String,
    pub upstream_remote: String,
    pub root_remote: String,
}

impl Default for BranchNames {
    fn default() -> Self {
        Self {
            tracking_prefix: "upstream/".into(),
            derived_prefix: "remapped/".into(),
            temp_prefix: "temp/".into(),
            upstream_remote: "upstream".into(),
            root_remote: "root".into(),
        }
    }
}

/// The four branches of a tracked version.
///
/// `tracking` and `derived` are published in the root repository. The mirror
/// advances its `temp_*` working counterparts and publishes them under the
/// published names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchTopology {
    /// Upstream branch being followed.
    pub version: String,
    pub upstream_remote: String,
    pub root_remote: String,
    pub tracking: String,
    pub derived: String,
    pub temp_tracking: String,
    pub temp_derived: String,
}

impl BranchTopology {
    pub fn new(version: impl Into<String>, names: &BranchNames) -> Self {
        let version = version.into();
        let tracking = format!("{}{version}", names.tracking_prefix);
        let derived = format!("{}{version}", names.derived_prefix);
        Self {
            temp_tracking: format!("{}{tracking}", names.temp_prefix),
            temp_derived: format!("{}{derived}", names.temp_prefix),
            upstream_remote: names.upstream_remote.clone(),
            root_remote: names.root_remote.clone(),
            tracking,
            derived,
            version,
        }
    }

    /// `refs/heads/<branch>`.
    pub fn local_ref(branch: &str) -> String {
        format!("refs/heads/{branch}")
    }

    pub fn upstream_ref(&self) -> String {
        format!("refs/remotes/{}/{}", self.upstream_remote, self.version)
    }

    /// Where the mirror keeps the root repository's copy of `branch`.
    pub fn root_ref(&self, branch: &str) -> String {
        format!("refs/remotes/{}/{branch}", self.root_remote)
    }

    pub fn upstream_refspec(&self) -> String {
        format!("+refs/heads/{}:{}", self.version, self.upstream_ref())
    }

    pub fn root_refspec(&self) -> String {
        format!("+refs/heads/*:refs/remotes/{}/*", self.root_remote)
    }

    /// `(mirror branch, root branch)` pairs that get published.
    pub fn published(&self) -> [(&str, &str); 2] {
        [
            (self.temp_tracking.as_str(), self.tracking.as_str()),
            (self.temp_derived.as_str(), self.derived.as_str()),
        ]
    }
}
