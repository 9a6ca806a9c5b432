//! In-memory multi-namespace symbol table.
//!
//! Nodes are classes keyed by their source-namespace name. Each class carries
//! one optional name per namespace and owns field/method nodes keyed by
//! `(source name, source descriptor)`. Descriptors are only stored in the
//! source namespace; other namespaces derive theirs through the class table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::MappingError;

/// Label of one naming scheme (`official`, `named`, `mojang`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Namespace(String);

impl Namespace {
    pub fn new(label: impl Into<String>) -> Result<Self, MappingError> {
        let label = label.into();
        if label.is_empty() || label == "-" || label.chars().any(char::is_whitespace) {
            return Err(MappingError::InvalidNamespace(label));
        }
        Ok(Self(label))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Namespace {
    type Error = MappingError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Namespace::new(value)
    }
}

impl From<Namespace> for String {
    fn from(value: Namespace) -> Self {
        value.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for Namespace {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MemberKind {
    Field,
    Method,
}

impl MemberKind {
    pub fn tag(self) -> &'static str {
        match self {
            MemberKind::Field => "f",
            MemberKind::Method => "m",
        }
    }
}

/// `(source name, source descriptor)`.
pub type MemberKey = (String, String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberMapping {
    pub(super) desc: String,
    pub(super) names: Vec<Option<String>>,
}

impl MemberMapping {
    /// `names[0]` is the source-namespace name and must be present.
    pub fn new(desc: impl Into<String>, names: Vec<Option<String>>) -> Self {
        Self {
            desc: desc.into(),
            names,
        }
    }

    pub fn descriptor(&self) -> &str {
        &self.desc
    }

    pub fn name(&self, ns: usize) -> Option<&str> {
        self.names.get(ns).and_then(|n| n.as_deref())
    }

    pub fn source_name(&self) -> &str {
        self.name(0).unwrap_or_default()
    }

    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    fn key(&self) -> MemberKey {
        (self.source_name().to_string(), self.desc.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    pub(super) names: Vec<Option<String>>,
    pub(super) fields: BTreeMap<MemberKey, MemberMapping>,
    pub(super) methods: BTreeMap<MemberKey, MemberMapping>,
}

impl ClassMapping {
    /// `names[0]` is the source-namespace name and must be present.
    pub fn new(names: Vec<Option<String>>) -> Self {
        Self {
            names,
            fields: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    pub fn name(&self, ns: usize) -> Option<&str> {
        self.names.get(ns).and_then(|n| n.as_deref())
    }

    pub fn source_name(&self) -> &str {
        self.name(0).unwrap_or_default()
    }

    pub fn names(&self) -> &[Option<String>] {
        &self.names
    }

    pub fn fields(&self) -> impl Iterator<Item = &MemberMapping> {
        self.fields.values()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MemberMapping> {
        self.methods.values()
    }

    pub fn members(&self, kind: MemberKind) -> impl Iterator<Item = &MemberMapping> {
        self.table(kind).values()
    }

    pub fn member(&self, kind: MemberKind, name: &str, desc: &str) -> Option<&MemberMapping> {
        self.table(kind).get(&(name.to_string(), desc.to_string()))
    }

    /// Inserts a member; when one with the same key exists, present names of
    /// the new member overwrite the existing ones.
    pub fn insert_member(&mut self, kind: MemberKind, member: MemberMapping) {
        let table = match kind {
            MemberKind::Field => &mut self.fields,
            MemberKind::Method => &mut self.methods,
        };
        match table.get_mut(&member.key()) {
            Some(existing) => merge_names(&mut existing.names, &member.names),
            None => {
                table.insert(member.key(), member);
            }
        }
    }

    fn table(&self, kind: MemberKind) -> &BTreeMap<MemberKey, MemberMapping> {
        match kind {
            MemberKind::Field => &self.fields,
            MemberKind::Method => &self.methods,
        }
    }

    fn normalize(&mut self, width: usize) {
        self.names.resize(width, None);
        for member in self.fields.values_mut().chain(self.methods.values_mut()) {
            member.names.resize(width, None);
        }
    }
}

/// Multi-namespace mapping table. `namespaces[0]` is the source namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingTree {
    pub(super) namespaces: Vec<Namespace>,
    pub(super) classes: BTreeMap<String, ClassMapping>,
}

impl MappingTree {
    pub fn new(namespaces: Vec<Namespace>) -> Result<Self, MappingError> {
        if namespaces.is_empty() {
            return Err(MappingError::InvalidNamespace(String::new()));
        }
        for (i, ns) in namespaces.iter().enumerate() {
            if namespaces[..i].contains(ns) {
                return Err(MappingError::DuplicateNamespace(ns.to_string()));
            }
        }
        Ok(Self {
            namespaces,
            classes: BTreeMap::new(),
        })
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    pub fn source(&self) -> &Namespace {
        &self.namespaces[0]
    }

    pub fn destinations(&self) -> &[Namespace] {
        &self.namespaces[1..]
    }

    pub fn namespace_index(&self, ns: &str) -> Result<usize, MappingError> {
        self.namespaces
            .iter()
            .position(|n| n.as_str() == ns)
            .ok_or_else(|| MappingError::UnknownNamespace(ns.to_string()))
    }

    pub fn class(&self, source_name: &str) -> Option<&ClassMapping> {
        self.classes.get(source_name)
    }

    /// Classes in source-name order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassMapping> {
        self.classes.values()
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Inserts a class, merging names and members into an existing node with
    /// the same source name.
    pub fn insert_class(&mut self, mut class: ClassMapping) {
        class.normalize(self.namespaces.len());
        let key = class.source_name().to_string();
        match self.classes.get_mut(&key) {
            Some(existing) => {
                merge_names(&mut existing.names, &class.names);
                for (kind, table) in [
                    (MemberKind::Field, class.fields),
                    (MemberKind::Method, class.methods),
                ] {
                    for member in table.into_values() {
                        existing.insert_member(kind, member);
                    }
                }
            }
            None => {
                self.classes.insert(key, class);
            }
        }
    }

    /// Source-to-`ns` class name table, used to carry descriptors across.
    pub(crate) fn class_names_to(&self, ns: usize) -> BTreeMap<&str, &str> {
        self.classes
            .iter()
            .filter_map(|(src, class)| class.name(ns).map(|dst| (src.as_str(), dst)))
            .collect()
    }
}

fn merge_names(into: &mut Vec<Option<String>>, from: &[Option<String>]) {
    if into.len() < from.len() {
        into.resize(from.len(), None);
    }
    for (slot, name) in into.iter_mut().zip(from) {
        if name.is_some() {
            slot.clone_from(name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(label: &str) -> Namespace {
        Namespace::new(label).unwrap()
    }

    fn names(values: &[&str]) -> Vec<Option<String>> {
        values
            .iter()
            .map(|v| (!v.is_empty()).then(|| v.to_string()))
            .collect()
    }

    #[test]
    fn namespace_rejects_whitespace_and_placeholder() {
        assert!(Namespace::new("named").is_ok());
        assert!(Namespace::new("").is_err());
        assert!(Namespace::new("a b").is_err());
        assert!(Namespace::new("-").is_err());
    }

    #[test]
    fn duplicate_namespaces_rejected() {
        let err = MappingTree::new(vec![ns("official"), ns("official")]).unwrap_err();
        assert!(matches!(err, MappingError::DuplicateNamespace(n) if n == "official"));
    }

    #[test]
    fn insert_class_merges_names_and_members() {
        let mut tree = MappingTree::new(vec![ns("official"), ns("named"), ns("mojang")]).unwrap();
        let mut first = ClassMapping::new(names(&["a", "Named", ""]));
        first.insert_member(MemberKind::Field, MemberMapping::new("I", names(&["b", "count"])));
        tree.insert_class(first);

        let mut second = ClassMapping::new(names(&["a", "", "Moj"]));
        second.insert_member(
            MemberKind::Field,
            MemberMapping::new("I", names(&["b", "", "size"])),
        );
        tree.insert_class(second);

        let class = tree.class("a").unwrap();
        assert_eq!(class.name(1), Some("Named"));
        assert_eq!(class.name(2), Some("Moj"));
        let field = class.member(MemberKind::Field, "b", "I").unwrap();
        assert_eq!(field.name(1), Some("count"));
        assert_eq!(field.name(2), Some("size"));
    }
}
