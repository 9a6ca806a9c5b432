//! Serializes visited entries back to descriptor text.

use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use tempfile::NamedTempFile;

use super::error::DescriptorError;
use super::model::{AccessDescriptor, AccessVisitor, HEADER_KEYWORD, Header, Rule};

/// Visitor that renders entries tab separated, one per line, in visit order.
#[derive(Debug, Default)]
pub struct DescriptorWriter {
    out: String,
    /// Version forced onto the written header.
    version: Option<u32>,
}

impl DescriptorWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_version(version: u32) -> Self {
        Self {
            out: String::new(),
            version: Some(version),
        }
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl AccessVisitor for DescriptorWriter {
    fn visit_header(&mut self, header: &Header) -> Result<(), DescriptorError> {
        let version = self.version.unwrap_or(header.version);
        let _ = writeln!(self.out, "{HEADER_KEYWORD}\tv{version}\t{}", header.namespace);
        Ok(())
    }

    fn visit_class(&mut self, name: &str, rule: Rule) -> Result<(), DescriptorError> {
        let _ = writeln!(self.out, "{rule}\tclass\t{name}");
        Ok(())
    }

    fn visit_method(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError> {
        let _ = writeln!(self.out, "{rule}\tmethod\t{owner}\t{name}\t{desc}");
        Ok(())
    }

    fn visit_field(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError> {
        let _ = writeln!(self.out, "{rule}\tfield\t{owner}\t{name}\t{desc}");
        Ok(())
    }
}

pub fn write_descriptor(descriptor: &AccessDescriptor) -> String {
    let mut writer = DescriptorWriter::new();
    // The writer never fails.
    let _ = descriptor.accept(&mut writer);
    writer.finish()
}

/// Writes `text` to `path` atomically, creating parent directories.
pub fn write_descriptor_file(path: &Path, text: &str) -> Result<(), DescriptorError> {
    let write_err = |source| DescriptorError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(write_err)?;
    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(text.as_bytes()).map_err(write_err)?;
    tmp.persist(path).map_err(|e| write_err(e.error))?;
    Ok(())
}
