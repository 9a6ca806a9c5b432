//! Remapping visitor for access descriptors.

use std::path::Path;

use crate::mapping::Remapper;

use super::error::DescriptorError;
use super::model::{AccessVisitor, Header, Rule};
use super::reader::read_descriptor;
use super::writer::{DescriptorWriter, write_descriptor_file};

/// A member reference with no destination name; its name was kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupMiss {
    pub kind: &'static str,
    pub owner: String,
    pub name: String,
    pub desc: String,
}

/// Forwards every entry to `delegate` with class, member and descriptor
/// names translated through `remapper`. The forwarded header carries
/// `header_namespace` instead of the input namespace.
pub struct RemappingVisitor<'r, V> {
    delegate: V,
    remapper: &'r Remapper,
    header_namespace: String,
    misses: Vec<LookupMiss>,
}

impl<'r, V: AccessVisitor> RemappingVisitor<'r, V> {
    pub fn new(delegate: V, remapper: &'r Remapper, header_namespace: impl Into<String>) -> Self {
        Self {
            delegate,
            remapper,
            header_namespace: header_namespace.into(),
            misses: Vec::new(),
        }
    }

    pub fn misses(&self) -> &[LookupMiss] {
        &self.misses
    }

    pub fn into_parts(self) -> (V, Vec<LookupMiss>) {
        (self.delegate, self.misses)
    }

    fn miss(&mut self, kind: &'static str, owner: &str, name: &str, desc: &str) {
        tracing::debug!(kind, owner, name, desc, "no mapping for access descriptor member, keeping name");
        self.misses.push(LookupMiss {
            kind,
            owner: owner.to_string(),
            name: name.to_string(),
            desc: desc.to_string(),
        });
    }
}

impl<V: AccessVisitor> AccessVisitor for RemappingVisitor<'_, V> {
    fn visit_header(&mut self, header: &Header) -> Result<(), DescriptorError> {
        let expected = self.remapper.from_namespace().as_str();
        if header.namespace != expected {
            return Err(DescriptorError::NamespaceMismatch {
                expected: expected.to_string(),
                found: header.namespace.clone(),
            });
        }
        self.delegate.visit_header(&Header {
            version: header.version,
            namespace: self.header_namespace.clone(),
        })
    }

    fn visit_class(&mut self, name: &str, rule: Rule) -> Result<(), DescriptorError> {
        let mapped = self.remapper.map_class(name);
        self.delegate.visit_class(mapped, rule)
    }

    fn visit_method(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError> {
        let remapper = self.remapper;
        let mapped = match remapper.map_method(owner, name, desc) {
            Some(mapped) => mapped,
            None => {
                self.miss("method", owner, name, desc);
                name
            }
        };
        self.delegate.visit_method(
            remapper.map_class(owner),
            mapped,
            &remapper.map_descriptor(desc),
            rule,
        )
    }

    fn visit_field(
        &mut self,
        owner: &str,
        name: &str,
        desc: &str,
        rule: Rule,
    ) -> Result<(), DescriptorError> {
        let remapper = self.remapper;
        let mapped = match remapper.map_field(owner, name, desc) {
            Some(mapped) => mapped,
            None => {
                self.miss("field", owner, name, desc);
                name
            }
        };
        self.delegate.visit_field(
            remapper.map_class(owner),
            mapped,
            &remapper.map_descriptor(desc),
            rule,
        )
    }
}

#[derive(Debug, Clone)]
pub struct RemappedDescriptor {
    pub text: String,
    pub misses: Vec<LookupMiss>,
}

/// Remaps descriptor text from the remapper's `from` namespace to its `to`
/// namespace, labelling the output header `header_namespace`.
pub fn remap_descriptor(
    text: &str,
    remapper: &Remapper,
    header_namespace: &str,
) -> Result<RemappedDescriptor, DescriptorError> {
    let mut visitor = RemappingVisitor::new(DescriptorWriter::new(), remapper, header_namespace);
    read_descriptor(text, &mut visitor)?;
    let (writer, misses) = visitor.into_parts();
    Ok(RemappedDescriptor {
        text: writer.finish(),
        misses,
    })
}

pub fn remap_descriptor_file(
    input: &Path,
    output: &Path,
    remapper: &Remapper,
    header_namespace: &str,
) -> Result<RemappedDescriptor, DescriptorError> {
    let text = std::fs::read_to_string(input).map_err(|source| DescriptorError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let remapped = remap_descriptor(&text, remapper, header_namespace)?;
    write_descriptor_file(output, &remapped.text)?;
    Ok(remapped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::parse_mappings;

    const TABLE: &str = "\
remap-mappings v1 named mojang
net/minecraft/entity/Entity net/minecraft/world/entity/Entity
\tf I age tickCount
\tm ()Lnet/minecraft/world/World; getWorld level
net/minecraft/world/World net/minecraft/world/level/Level
";

    fn remapper() -> Remapper {
        Remapper::new(&parse_mappings(TABLE).unwrap(), "named", "mojang").unwrap()
    }

    #[test]
    fn remaps_entries_and_rewrites_header() {
        let text = "\
accessWidener v2 named
accessible class net/minecraft/world/World
transitive-accessible method net/minecraft/entity/Entity getWorld ()Lnet/minecraft/world/World;
mutable field net/minecraft/entity/Entity age I
";
        let remapped = remap_descriptor(text, &remapper(), "named").unwrap();
        assert_eq!(
            remapped.text,
            "accessWidener\tv2\tnamed\n\
             accessible\tclass\tnet/minecraft/world/level/Level\n\
             transitive-accessible\tmethod\tnet/minecraft/world/entity/Entity\tlevel\t()Lnet/minecraft/world/level/Level;\n\
             mutable\tfield\tnet/minecraft/world/entity/Entity\ttickCount\tI\n"
        );
        assert!(remapped.misses.is_empty());
    }

    #[test]
    fn missing_member_keeps_its_name() {
        let text = "accessWidener v1 named\naccessible method net/minecraft/entity/Entity synthetic$0 ()V\n";
        let remapped = remap_descriptor(text, &remapper(), "mojang").unwrap();
        assert_eq!(
            remapped.text,
            "accessWidener\tv1\tmojang\naccessible\tmethod\tnet/minecraft/world/entity/Entity\tsynthetic$0\t()V\n"
        );
        assert_eq!(remapped.misses.len(), 1);
        assert_eq!(remapped.misses[0].name, "synthetic$0");
    }

    #[test]
    fn header_namespace_must_match() {
        let err = remap_descriptor("accessWidener v1 official\n", &remapper(), "named").unwrap_err();
        assert!(matches!(
            err,
            DescriptorError::NamespaceMismatch { ref expected, ref found }
                if expected == "named" && found == "official"
        ));
    }
}
