//! Config loading and persistence.

use std::path::PathBuf;

use thiserror::Error;

use crate::error::{Effect, Transience};

mod load;
mod merge;
mod schema;

pub use load::{
    config_path, discover_repo_root, load, load_for_repo, load_repo_config, load_user_config,
    repo_config_path, write_config,
};
pub use merge::{apply_env_overrides, apply_overrides_from, merge_layers};
pub use schema::{
    Config, ConfigLayer, FileLoggingConfig, FileLoggingConfigOverride, LogFormat, LogRotation,
    LoggingConfig, LoggingConfigOverride, MappingsConfig, MappingsConfigOverride, MirrorConfig,
    RemapConfig, RemapConfigOverride, SyncSettingsOverride, UpstreamConfig,
    UpstreamConfigOverride,
};

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("missing required setting `{0}`")]
    Missing(&'static str),
}

impl ConfigError {
    pub fn transience(&self) -> Transience {
        match self {
            ConfigError::Read { .. } | ConfigError::Write { .. } => Transience::Unknown,
            _ => Transience::Permanent,
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            ConfigError::Write { .. } => Effect::Unknown,
            _ => Effect::None,
        }
    }
}
