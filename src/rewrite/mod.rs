//! Source rewriter.
//!
//! Applies a namespace-pair [`crate::mapping::Remapper`] to the projects of a
//! source tree. Each compilation unit is tokenized, its type references are
//! resolved against the file's package and imports plus a classpath index,
//! and every resolvable type, member and import name is substituted in
//! place. A pre-pass resolves names hidden inside mixin annotation literals.
//!
//! Projects run in parallel on a worker pool; a failing project or file is
//! reported without failing the run. [`interfaces`] gathers the injected
//! interface declarations of every project.

mod archive;
pub mod classpath;
mod engine;
mod error;
pub mod interfaces;
pub mod lexer;
pub mod mixin;
mod pool;
pub mod project;
pub mod scope;
pub mod unit;

pub use archive::{ArchiveKind, SourceRoot};
pub use classpath::ClassIndex;
pub use engine::{InProcessRemapper, TreeRemapper};
pub use error::{RemapWarning, RewriteError};
pub use interfaces::{InjectedInterfaces, collect_injected_interfaces, write_injected_interfaces};
pub use mixin::{MixinHints, collect_hints};
pub use pool::{ProjectReport, RemapReport, run_projects};
pub use project::{Project, ProjectLayout, ProjectStats, discover_projects, remap_project};
pub use unit::{Edit, RewriteContext, RewrittenUnit, apply_edits, rewrite_unit};
