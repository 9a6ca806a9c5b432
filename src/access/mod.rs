//! Access descriptor remapper.
//!
//! Reads versioned access-relaxation descriptors, remaps their class, method
//! and field references through a [`crate::mapping::Remapper`] and writes
//! them back out. Members the table does not know keep their names.

mod error;
pub mod merge;
pub mod model;
pub mod reader;
pub mod remap;
pub mod writer;

pub use error::DescriptorError;
pub use merge::{merge_descriptor_files, merge_descriptors};
pub use model::{Access, AccessDescriptor, AccessVisitor, Entry, Header, Rule, Target};
pub use reader::{parse_descriptor, read_descriptor, read_descriptor_file, read_version};
pub use remap::{
    LookupMiss, RemappedDescriptor, RemappingVisitor, remap_descriptor, remap_descriptor_file,
};
pub use writer::{DescriptorWriter, write_descriptor, write_descriptor_file};
