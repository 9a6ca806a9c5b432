use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::external::ExternalCommand;
use crate::git::{BranchNames, BranchTopology, SyncSettings};
use crate::rewrite::ProjectLayout;

use super::ConfigError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub upstream: UpstreamConfig,
    pub branches: BranchNames,
    pub mirror: MirrorConfig,
    pub mappings: MappingsConfig,
    pub remap: RemapConfig,
    pub sync: SyncSettings,
    pub logging: LoggingConfig,
}

impl Config {
    pub fn upstream_url(&self) -> Result<&str, ConfigError> {
        self.upstream
            .url
            .as_deref()
            .ok_or(ConfigError::Missing("upstream.url"))
    }

    pub fn topology(&self) -> BranchTopology {
        BranchTopology::new(self.upstream.branch.clone(), &self.branches)
    }

    /// Mirror directory for `root`; relative paths are taken from `root`.
    pub fn mirror_dir(&self, root: &Path) -> PathBuf {
        match &self.mirror.dir {
            Some(dir) if dir.is_absolute() => dir.clone(),
            Some(dir) => root.join(dir),
            None => crate::paths::mirror_dir(root, &self.upstream.branch),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub url: Option<String>,
    /// Upstream branch followed; also names the version in branch names.
    pub branch: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            branch: "main".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingsConfig {
    /// Table `origin -> A`.
    pub primary: Option<PathBuf>,
    /// Table `origin -> B`.
    pub secondary: Option<PathBuf>,
    pub intermediate: String,
    pub promote: String,
    /// Where the composed `A -> B` table is written and read from.
    pub output: PathBuf,
}

impl Default for MappingsConfig {
    fn default() -> Self {
        Self {
            primary: None,
            secondary: None,
            intermediate: "intermediate".into(),
            promote: "mojang".into(),
            output: PathBuf::from("build/remap/composed.mappings"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemapConfig {
    pub from: String,
    pub to: String,
    pub header_namespace: String,
    pub project_prefix: String,
    pub excluded: Vec<String>,
    pub metadata_file: String,
    pub descriptor_key: String,
    /// Jars, archives or directories whose classes resolve on-demand imports.
    pub classpath: Vec<PathBuf>,
    pub workers: Option<usize>,
    /// Regenerates remapped sources out of process instead of in-process.
    pub command: Option<ExternalCommand>,
}

impl Default for RemapConfig {
    fn default() -> Self {
        let layout = ProjectLayout::default();
        Self {
            from: "named".into(),
            to: "mojang".into(),
            header_namespace: layout.header_namespace,
            project_prefix: layout.project_prefix,
            excluded: layout.excluded,
            metadata_file: layout.metadata_file,
            descriptor_key: layout.descriptor_key,
            classpath: Vec::new(),
            workers: None,
            command: None,
        }
    }
}

impl RemapConfig {
    pub fn layout(&self) -> ProjectLayout {
        ProjectLayout {
            project_prefix: self.project_prefix.clone(),
            excluded: self.excluded.clone(),
            metadata_file: self.metadata_file.clone(),
            descriptor_key: self.descriptor_key.clone(),
            header_namespace: self.header_namespace.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Compact,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogRotation {
    Daily,
    Hourly,
    Minutely,
    Never,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub stdout: bool,
    pub stdout_format: LogFormat,
    pub filter: Option<String>,
    pub file: FileLoggingConfig,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            stdout: true,
            stdout_format: LogFormat::Compact,
            filter: None,
            file: FileLoggingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    pub enabled: bool,
    pub dir: Option<PathBuf>,
    pub format: LogFormat,
    pub rotation: LogRotation,
    pub retention_max_files: Option<usize>,
}

impl Default for FileLoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: None,
            format: LogFormat::Json,
            rotation: LogRotation::Daily,
            retention_max_files: Some(10),
        }
    }
}

// =============================================================================
// Layers
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UpstreamConfigOverride {
    pub url: Option<String>,
    pub branch: Option<String>,
}

impl UpstreamConfigOverride {
    pub fn apply_to(&self, target: &mut UpstreamConfig) {
        if let Some(url) = self.url.as_ref() {
            target.url = Some(url.clone());
        }
        if let Some(branch) = self.branch.as_ref() {
            target.branch = branch.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MappingsConfigOverride {
    pub primary: Option<PathBuf>,
    pub secondary: Option<PathBuf>,
    pub intermediate: Option<String>,
    pub promote: Option<String>,
    pub output: Option<PathBuf>,
}

impl MappingsConfigOverride {
    pub fn apply_to(&self, target: &mut MappingsConfig) {
        if let Some(primary) = self.primary.as_ref() {
            target.primary = Some(primary.clone());
        }
        if let Some(secondary) = self.secondary.as_ref() {
            target.secondary = Some(secondary.clone());
        }
        if let Some(intermediate) = self.intermediate.as_ref() {
            target.intermediate = intermediate.clone();
        }
        if let Some(promote) = self.promote.as_ref() {
            target.promote = promote.clone();
        }
        if let Some(output) = self.output.as_ref() {
            target.output = output.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RemapConfigOverride {
    pub from: Option<String>,
    pub to: Option<String>,
    pub header_namespace: Option<String>,
    pub project_prefix: Option<String>,
    pub excluded: Option<Vec<String>>,
    pub metadata_file: Option<String>,
    pub descriptor_key: Option<String>,
    pub classpath: Option<Vec<PathBuf>>,
    pub workers: Option<usize>,
    pub command: Option<ExternalCommand>,
}

impl RemapConfigOverride {
    pub fn apply_to(&self, target: &mut RemapConfig) {
        if let Some(from) = self.from.as_ref() {
            target.from = from.clone();
        }
        if let Some(to) = self.to.as_ref() {
            target.to = to.clone();
        }
        if let Some(ns) = self.header_namespace.as_ref() {
            target.header_namespace = ns.clone();
        }
        if let Some(prefix) = self.project_prefix.as_ref() {
            target.project_prefix = prefix.clone();
        }
        if let Some(excluded) = self.excluded.as_ref() {
            target.excluded = excluded.clone();
        }
        if let Some(file) = self.metadata_file.as_ref() {
            target.metadata_file = file.clone();
        }
        if let Some(key) = self.descriptor_key.as_ref() {
            target.descriptor_key = key.clone();
        }
        if let Some(classpath) = self.classpath.as_ref() {
            target.classpath = classpath.clone();
        }
        if self.workers.is_some() {
            target.workers = self.workers;
        }
        if let Some(command) = self.command.as_ref() {
            target.command = Some(command.clone());
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncSettingsOverride {
    pub suffixes: Option<Vec<String>>,
    pub max_commits: Option<usize>,
    pub setup_message: Option<String>,
    pub refresh_message: Option<String>,
}

impl SyncSettingsOverride {
    pub fn apply_to(&self, target: &mut SyncSettings) {
        if let Some(suffixes) = self.suffixes.as_ref() {
            target.suffixes = suffixes.clone();
        }
        if let Some(max) = self.max_commits {
            target.max_commits = max;
        }
        if let Some(message) = self.setup_message.as_ref() {
            target.setup_message = message.clone();
        }
        if let Some(message) = self.refresh_message.as_ref() {
            target.refresh_message = message.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfigOverride {
    pub stdout: Option<bool>,
    pub stdout_format: Option<LogFormat>,
    pub filter: Option<String>,
    pub file: Option<FileLoggingConfigOverride>,
}

impl LoggingConfigOverride {
    pub fn apply_to(&self, target: &mut LoggingConfig) {
        if let Some(stdout) = self.stdout {
            target.stdout = stdout;
        }
        if let Some(format) = self.stdout_format {
            target.stdout_format = format;
        }
        if let Some(filter) = self.filter.as_ref() {
            target.filter = Some(filter.clone());
        }
        if let Some(file) = self.file.as_ref() {
            file.apply_to(&mut target.file);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FileLoggingConfigOverride {
    pub enabled: Option<bool>,
    pub dir: Option<PathBuf>,
    pub format: Option<LogFormat>,
    pub rotation: Option<LogRotation>,
    pub retention_max_files: Option<usize>,
}

impl FileLoggingConfigOverride {
    pub fn apply_to(&self, target: &mut FileLoggingConfig) {
        if let Some(enabled) = self.enabled {
            target.enabled = enabled;
        }
        if let Some(dir) = self.dir.as_ref() {
            target.dir = Some(dir.clone());
        }
        if let Some(format) = self.format {
            target.format = format;
        }
        if let Some(rotation) = self.rotation {
            target.rotation = rotation;
        }
        if let Some(files) = self.retention_max_files {
            target.retention_max_files = Some(files);
        }
    }
}

/// One config file. Every field is optional and only set fields override.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ConfigLayer {
    pub upstream: UpstreamConfigOverride,
    /// Replaces the branch naming as a whole.
    pub branches: Option<BranchNames>,
    pub mirror: MirrorConfig,
    pub mappings: MappingsConfigOverride,
    pub remap: RemapConfigOverride,
    pub sync: SyncSettingsOverride,
    pub logging: LoggingConfigOverride,
}

impl ConfigLayer {
    pub fn apply_to(&self, base: &mut Config) {
        self.upstream.apply_to(&mut base.upstream);
        if let Some(branches) = &self.branches {
            base.branches = branches.clone();
        }
        if let Some(dir) = self.mirror.dir.as_ref() {
            base.mirror.dir = Some(dir.clone());
        }
        self.mappings.apply_to(&mut base.mappings);
        self.remap.apply_to(&mut base.remap);
        self.sync.apply_to(&mut base.sync);
        self.logging.apply_to(&mut base.logging);
    }
}
