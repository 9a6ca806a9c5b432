//! Mapping composer: multi-namespace symbol tables, their pure
//! transformations, composition and namespace-pair lookup.

pub mod compose;
pub mod descriptor;
mod error;
pub mod format;
pub mod remapper;
pub mod tiny;
mod transform;
pub mod tree;

pub use compose::{ComposeOutputs, Composed, Composition, compose, compose_files};
pub use error::MappingError;
pub use format::{parse_any, parse_mappings, read_mappings, write_mappings, write_mappings_file};
pub use remapper::{MemberEntry, Remapper};
pub use tree::{ClassMapping, MappingTree, MemberKind, MemberMapping, Namespace};
