use thiserror::Error;

use crate::access::DescriptorError;
use crate::config::ConfigError;
use crate::external::ExternalProcessFailure;
use crate::git::SyncError;
use crate::mapping::MappingError;
use crate::rewrite::RewriteError;

/// Whether retrying this operation may succeed.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Transience {
    /// Retry will never help without changing inputs/state.
    Permanent,
    /// Retry may help (transient contention/outage).
    Retryable,
    /// Unknown if retry will help.
    Unknown,
}

impl Transience {
    pub fn is_retryable(self) -> bool {
        matches!(self, Transience::Retryable)
    }
}

/// What we know about side effects when an error is returned.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Effect {
    /// Definitely no side effects occurred.
    None,
    /// Side effects definitely occurred (locally or remotely).
    Some,
    /// We don't know if side effects occurred.
    Unknown,
}

impl Effect {
    pub fn as_str(self) -> &'static str {
        match self {
            Effect::None => "none",
            Effect::Some => "some",
            Effect::Unknown => "unknown",
        }
    }
}

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over canonical capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    External(#[from] ExternalProcessFailure),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Error {
    pub fn transience(&self) -> Transience {
        match self {
            Error::Mapping(e) => e.transience(),
            Error::Descriptor(e) => e.transience(),
            Error::Rewrite(e) => e.transience(),
            Error::Sync(e) => e.transience(),
            Error::External(e) => e.transience(),
            Error::Config(e) => e.transience(),
        }
    }

    pub fn effect(&self) -> Effect {
        match self {
            Error::Mapping(e) => e.effect(),
            Error::Descriptor(e) => e.effect(),
            Error::Rewrite(e) => e.effect(),
            Error::Sync(e) => e.effect(),
            Error::External(e) => e.effect(),
            Error::Config(e) => e.effect(),
        }
    }
}
