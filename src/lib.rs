#![forbid(unsafe_code)]

//! Keeps a vendored upstream tree synchronized with its history while
//! re-expressing every identifier under another naming scheme.
//!
//! - [`mapping`] composes origin-keyed symbol tables into one namespace pair
//! - [`rewrite`] applies that pair to whole source trees
//! - [`access`] remaps access-relaxation descriptors
//! - [`git`] replays upstream commits onto the remapped branch

pub mod access;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod external;
pub mod git;
pub mod mapping;
pub mod paths;
pub mod rewrite;
pub mod telemetry;

pub use error::{Effect, Error, Transience};
pub type Result<T> = std::result::Result<T, Error>;
