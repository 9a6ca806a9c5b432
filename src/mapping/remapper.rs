//! Namespace-pair lookup view over a [`MappingTree`].

use std::collections::HashMap;

use super::descriptor::map_descriptor;
use super::error::MappingError;
use super::tree::{MappingTree, MemberKind, Namespace};

/// One member as seen from the `from` namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberEntry {
    pub kind: MemberKind,
    pub owner: String,
    pub name: String,
    pub desc: String,
    /// Destination name; `None` when the table has no name in `to`.
    pub target: Option<String>,
}

impl MemberEntry {
    /// Destination name, falling back to the current name.
    pub fn target_or_name(&self) -> &str {
        self.target.as_deref().unwrap_or(&self.name)
    }
}

type MemberLookup = HashMap<(String, String, String), usize>;

/// Owned `from -> to` view. Class, field and method names are looked up in
/// the `from` namespace; descriptors are expressed in `from` as well.
#[derive(Debug, Clone)]
pub struct Remapper {
    from: Namespace,
    to: Namespace,
    classes: HashMap<String, Option<String>>,
    members: Vec<MemberEntry>,
    fields: MemberLookup,
    methods: MemberLookup,
    by_owner: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl Remapper {
    pub fn new(tree: &MappingTree, from: &str, to: &str) -> Result<Self, MappingError> {
        let fi = tree.namespace_index(from)?;
        let ti = tree.namespace_index(to)?;
        let to_from = tree.class_names_to(fi);

        let mut remapper = Remapper {
            from: tree.namespaces()[fi].clone(),
            to: tree.namespaces()[ti].clone(),
            classes: HashMap::with_capacity(tree.class_count()),
            members: Vec::new(),
            fields: HashMap::new(),
            methods: HashMap::new(),
            by_owner: HashMap::new(),
            by_name: HashMap::new(),
        };

        for class in tree.classes() {
            let Some(owner) = class.name(fi) else {
                continue;
            };
            remapper
                .classes
                .insert(owner.to_string(), class.name(ti).map(str::to_string));

            for kind in [MemberKind::Field, MemberKind::Method] {
                for member in class.members(kind) {
                    let Some(name) = member.name(fi) else {
                        continue;
                    };
                    let desc = if fi == 0 {
                        member.descriptor().to_string()
                    } else {
                        map_descriptor(member.descriptor(), |c| to_from.get(c).copied())
                    };
                    remapper.push_member(MemberEntry {
                        kind,
                        owner: owner.to_string(),
                        name: name.to_string(),
                        desc,
                        target: member.name(ti).map(str::to_string),
                    });
                }
            }
        }
        Ok(remapper)
    }

    fn push_member(&mut self, entry: MemberEntry) {
        let idx = self.members.len();
        let key = (entry.owner.clone(), entry.name.clone(), entry.desc.clone());
        match entry.kind {
            MemberKind::Field => self.fields.insert(key, idx),
            MemberKind::Method => self.methods.insert(key, idx),
        };
        self.by_owner
            .entry(entry.owner.clone())
            .or_default()
            .push(idx);
        self.by_name.entry(entry.name.clone()).or_default().push(idx);
        self.members.push(entry);
    }

    pub fn from_namespace(&self) -> &Namespace {
        &self.from
    }

    pub fn to_namespace(&self) -> &Namespace {
        &self.to
    }

    pub fn knows_class(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Destination name of `name`, or `None` when the class is unknown or
    /// has no name in `to`.
    pub fn lookup_class(&self, name: &str) -> Option<&str> {
        self.classes.get(name).and_then(|n| n.as_deref())
    }

    /// Destination class name, identity for unknown classes.
    pub fn map_class<'a>(&'a self, name: &'a str) -> &'a str {
        self.lookup_class(name).unwrap_or(name)
    }

    pub fn map_field(&self, owner: &str, name: &str, desc: &str) -> Option<&str> {
        self.lookup(&self.fields, owner, name, desc)
    }

    pub fn map_method(&self, owner: &str, name: &str, desc: &str) -> Option<&str> {
        self.lookup(&self.methods, owner, name, desc)
    }

    fn lookup(&self, table: &MemberLookup, owner: &str, name: &str, desc: &str) -> Option<&str> {
        let idx = table.get(&(owner.to_string(), name.to_string(), desc.to_string()))?;
        self.members[*idx].target.as_deref()
    }

    pub fn map_descriptor(&self, desc: &str) -> String {
        map_descriptor(desc, |c| self.lookup_class(c))
    }

    /// Classes known in the `from` namespace.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.classes.keys().map(String::as_str)
    }

    pub fn members_of(&self, owner: &str) -> impl Iterator<Item = &MemberEntry> {
        self.by_owner
            .get(owner)
            .into_iter()
            .flatten()
            .map(|&i| &self.members[i])
    }

    /// Every member, in any class, named `name` in the `from` namespace.
    pub fn members_named(&self, name: &str) -> impl Iterator<Item = &MemberEntry> {
        self.by_name
            .get(name)
            .into_iter()
            .flatten()
            .map(|&i| &self.members[i])
    }
}
