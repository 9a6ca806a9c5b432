use std::collections::HashSet;
use std::path::Path;

use super::error::DescriptorError;
use super::model::AccessDescriptor;
use super::reader::read_descriptor_file;
use super::writer::{write_descriptor, write_descriptor_file};

/// Concatenates descriptors that share one namespace. The highest version
/// wins and repeated entries are kept once, at their first position.
pub fn merge_descriptors(
    descriptors: &[AccessDescriptor],
) -> Result<AccessDescriptor, DescriptorError> {
    let first = descriptors.first().ok_or(DescriptorError::NothingToMerge)?;
    let namespace = &first.header.namespace;
    let mut merged = AccessDescriptor::new(first.header.version, namespace.clone());
    let mut seen = HashSet::new();

    for descriptor in descriptors {
        if descriptor.header.namespace != *namespace {
            return Err(DescriptorError::NamespaceMismatch {
                expected: namespace.clone(),
                found: descriptor.header.namespace.clone(),
            });
        }
        merged.header.version = merged.header.version.max(descriptor.header.version);
        for entry in &descriptor.entries {
            if seen.insert(entry) {
                merged.entries.push(entry.clone());
            }
        }
    }
    Ok(merged)
}

pub fn merge_descriptor_files(
    inputs: &[impl AsRef<Path>],
    output: &Path,
) -> Result<AccessDescriptor, DescriptorError> {
    let descriptors = inputs
        .iter()
        .map(|p| read_descriptor_file(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_descriptors(&descriptors)?;
    write_descriptor_file(output, &write_descriptor(&merged))?;
    tracing::info!(
        inputs = inputs.len(),
        entries = merged.entries.len(),
        output = %output.display(),
        "merged access descriptors"
    );
    Ok(merged)
}
